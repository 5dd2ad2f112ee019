//! Date/time field row with "Now" and "Locate" buttons.
//!
//! Click a field to focus it, type digits, step with ArrowUp/ArrowDown,
//! commit with Enter or Tab (Tab moves to the next field), cancel with Escape.
//! Every edit goes through calendar normalization before touching the observer.

use bevy::prelude::*;
use chrono::NaiveDateTime;

use super::geolocation::{GeolocationChannels, GeolocationCommand};
use super::{DateTimeField, ObserverState};

const FIELD_BG: Color = Color::srgba(0.06, 0.12, 0.16, 0.9);
const FIELD_BG_FOCUSED: Color = Color::srgba(0.1, 0.28, 0.36, 0.98);
const BUTTON_BG: Color = Color::srgba(0.08, 0.22, 0.28, 0.95);
const TEXT_COLOR: Color = Color::srgba(0.7, 1.0, 1.0, 1.0);

#[derive(Component)]
pub struct FieldButton(pub DateTimeField);

#[derive(Component)]
pub struct FieldText(pub DateTimeField);

#[derive(Component)]
pub struct NowButton;

#[derive(Component)]
pub struct LocateButton;

/// Keyboard focus and typed-but-uncommitted digits.
#[derive(Resource, Default, Debug)]
pub struct FieldEditor {
    pub focused: Option<DateTimeField>,
    pub buffer: String,
}

impl FieldEditor {
    pub fn focus(&mut self, field: DateTimeField) {
        self.focused = Some(field);
        self.buffer.clear();
    }

    pub fn push_digit(&mut self, digit: char) {
        if let Some(field) = self.focused
            && self.buffer.len() < field.width()
        {
            self.buffer.push(digit);
        }
    }

    /// Apply the typed value to `local`. Empty or unparseable input is discarded.
    pub fn commit(&mut self, local: NaiveDateTime) -> Option<NaiveDateTime> {
        let buffer = std::mem::take(&mut self.buffer);
        let field = self.focused?;
        let value = buffer.parse::<i64>().ok()?;
        field.set(local, value)
    }

    pub fn cancel(&mut self) {
        self.focused = None;
        self.buffer.clear();
    }

    /// Text shown for `field`: the pending digits when focused, else the value.
    pub fn display(&self, field: DateTimeField, local: NaiveDateTime) -> String {
        if self.focused == Some(field) && !self.buffer.is_empty() {
            return self.buffer.clone();
        }
        format!("{:0width$}", field.get(local), width = field.width())
    }
}

fn digit_for(key: KeyCode) -> Option<char> {
    let digit = match key {
        KeyCode::Digit0 | KeyCode::Numpad0 => '0',
        KeyCode::Digit1 | KeyCode::Numpad1 => '1',
        KeyCode::Digit2 | KeyCode::Numpad2 => '2',
        KeyCode::Digit3 | KeyCode::Numpad3 => '3',
        KeyCode::Digit4 | KeyCode::Numpad4 => '4',
        KeyCode::Digit5 | KeyCode::Numpad5 => '5',
        KeyCode::Digit6 | KeyCode::Numpad6 => '6',
        KeyCode::Digit7 | KeyCode::Numpad7 => '7',
        KeyCode::Digit8 | KeyCode::Numpad8 => '8',
        KeyCode::Digit9 | KeyCode::Numpad9 => '9',
        _ => return None,
    };
    Some(digit)
}

fn update_local(observer: &mut ResMut<ObserverState>, local: Option<NaiveDateTime>) {
    if let Some(local) = local
        && observer.local != local
    {
        observer.local = local;
    }
}

fn label(text: &'static str) -> impl Bundle {
    (
        Text::new(text),
        TextFont {
            font_size: 16.0,
            ..default()
        },
        TextColor(TEXT_COLOR),
    )
}

pub fn spawn_input_bar(mut commands: Commands) {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                top: Val::Px(10.0),
                left: Val::Px(10.0),
                flex_direction: FlexDirection::Row,
                align_items: AlignItems::Center,
                column_gap: Val::Px(4.0),
                ..default()
            },
            Name::new("Date/time input bar"),
        ))
        .with_children(|bar| {
            for field in DateTimeField::ORDER {
                let separator = match field {
                    DateTimeField::Month | DateTimeField::Year => Some("/"),
                    DateTimeField::Hour => Some("-"),
                    DateTimeField::Minute => Some(":"),
                    DateTimeField::Day => None,
                };
                if let Some(separator) = separator {
                    bar.spawn(label(separator));
                }
                bar.spawn((
                    Button,
                    Node {
                        padding: UiRect::axes(Val::Px(6.0), Val::Px(3.0)),
                        justify_content: JustifyContent::Center,
                        ..default()
                    },
                    BackgroundColor(FIELD_BG),
                    FieldButton(field),
                ))
                .with_child((label(""), FieldText(field)));
            }

            for (text, is_now) in [("Now", true), ("Locate", false)] {
                let mut button = bar.spawn((
                    Button,
                    Node {
                        padding: UiRect::axes(Val::Px(8.0), Val::Px(3.0)),
                        margin: UiRect::left(Val::Px(6.0)),
                        ..default()
                    },
                    BackgroundColor(BUTTON_BG),
                ));
                button.with_child(label(text));
                if is_now {
                    button.insert(NowButton);
                } else {
                    button.insert(LocateButton);
                }
            }
        });
}

pub fn focus_clicked_field(
    fields: Query<(&Interaction, &FieldButton), Changed<Interaction>>,
    mut editor: ResMut<FieldEditor>,
    mut observer: ResMut<ObserverState>,
) {
    for (interaction, FieldButton(field)) in &fields {
        if *interaction == Interaction::Pressed && editor.focused != Some(*field) {
            // Switching fields commits what was typed in the previous one.
            let committed = editor.commit(observer.local);
            update_local(&mut observer, committed);
            editor.focus(*field);
        }
    }
}

pub fn edit_focused_field(
    keys: Res<ButtonInput<KeyCode>>,
    mut editor: ResMut<FieldEditor>,
    mut observer: ResMut<ObserverState>,
) {
    let Some(field) = editor.focused else {
        return;
    };

    for key in keys.get_just_pressed() {
        if let Some(digit) = digit_for(*key) {
            editor.push_digit(digit);
            continue;
        }
        match key {
            KeyCode::Backspace => {
                editor.buffer.pop();
            }
            KeyCode::ArrowUp | KeyCode::ArrowDown => {
                let delta = if *key == KeyCode::ArrowUp { 1 } else { -1 };
                editor.buffer.clear();
                let stepped = field.set(observer.local, field.get(observer.local) + delta);
                update_local(&mut observer, stepped);
            }
            KeyCode::Enter | KeyCode::NumpadEnter | KeyCode::Tab => {
                let committed = editor.commit(observer.local);
                update_local(&mut observer, committed);
                editor.focused = (*key == KeyCode::Tab).then(|| field.next());
            }
            KeyCode::Escape => editor.cancel(),
            _ => {}
        }
    }
}

pub fn handle_control_buttons(
    buttons: Query<
        (&Interaction, Has<NowButton>, Has<LocateButton>),
        (Changed<Interaction>, With<Button>),
    >,
    mut observer: ResMut<ObserverState>,
    mut editor: ResMut<FieldEditor>,
    channels: Option<Res<GeolocationChannels>>,
) {
    for (interaction, is_now, is_locate) in &buttons {
        if *interaction != Interaction::Pressed {
            continue;
        }
        if is_now {
            editor.cancel();
            observer.set_now();
        } else if is_locate {
            match &channels {
                Some(channels) => {
                    info!("Requesting observer location");
                    let _ = channels.cmd_tx.send(GeolocationCommand::Locate);
                }
                None => warn!("Geolocation worker not running"),
            }
        }
    }
}

pub fn refresh_field_texts(
    editor: Res<FieldEditor>,
    observer: Res<ObserverState>,
    mut texts: Query<(&FieldText, &mut Text)>,
    mut backgrounds: Query<(&FieldButton, &mut BackgroundColor)>,
) {
    if !editor.is_changed() && !observer.is_changed() {
        return;
    }

    for (FieldText(field), mut text) in &mut texts {
        text.0 = editor.display(*field, observer.local);
    }
    for (FieldButton(field), mut background) in &mut backgrounds {
        background.0 = if editor.focused == Some(*field) {
            FIELD_BG_FOCUSED
        } else {
            FIELD_BG
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 21)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_typed_digits_respect_field_width() {
        let mut editor = FieldEditor::default();
        editor.focus(DateTimeField::Hour);
        for digit in ['1', '9', '7'] {
            editor.push_digit(digit);
        }
        assert_eq!(editor.buffer, "19");

        editor.focus(DateTimeField::Year);
        for digit in ['2', '0', '2', '5', '1'] {
            editor.push_digit(digit);
        }
        assert_eq!(editor.buffer, "2025");
    }

    #[test]
    fn test_digits_ignored_without_focus() {
        let mut editor = FieldEditor::default();
        editor.push_digit('4');
        assert!(editor.buffer.is_empty());
    }

    #[test]
    fn test_commit_normalizes() {
        let mut editor = FieldEditor::default();
        editor.focus(DateTimeField::Day);
        editor.push_digit('3');
        editor.push_digit('1');

        let committed = editor.commit(noon()).unwrap();
        assert_eq!(
            committed,
            NaiveDate::from_ymd_opt(2024, 7, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap()
        );
        assert!(editor.buffer.is_empty());
    }

    #[test]
    fn test_empty_commit_is_discarded() {
        let mut editor = FieldEditor::default();
        editor.focus(DateTimeField::Minute);
        assert_eq!(editor.commit(noon()), None);
    }

    #[test]
    fn test_display_pads_and_shows_buffer() {
        let mut editor = FieldEditor::default();
        let t = noon();
        assert_eq!(editor.display(DateTimeField::Month, t), "06");
        assert_eq!(editor.display(DateTimeField::Year, t), "2024");
        assert_eq!(editor.display(DateTimeField::Minute, t), "00");

        editor.focus(DateTimeField::Month);
        editor.push_digit('1');
        assert_eq!(editor.display(DateTimeField::Month, t), "1");
        assert_eq!(editor.display(DateTimeField::Day, t), "21");

        editor.cancel();
        assert_eq!(editor.display(DateTimeField::Month, t), "06");
    }

    #[test]
    fn test_digit_keys() {
        assert_eq!(digit_for(KeyCode::Digit7), Some('7'));
        assert_eq!(digit_for(KeyCode::Numpad0), Some('0'));
        assert_eq!(digit_for(KeyCode::KeyA), None);
    }
}
