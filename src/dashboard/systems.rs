//! Dashboard panel: header, weather polling and forecast cards.

use bevy::prelude::*;
use chrono::{NaiveDate, NaiveTime};

use super::builder::build_forecast;
use super::fetcher::{WeatherSource, start_weather_worker};
use super::types::{
    DashboardState, ForecastCards, ForecastDay, WeatherChannels, WeatherCommand, WeatherResult,
};
use crate::config::AppSettings;
use crate::ephemeris::LowPrecisionEphemeris;
use crate::observer::ObserverState;

const PANEL_BG: Color = Color::srgba(0.02, 0.06, 0.08, 0.85);
const CARD_BG: Color = Color::srgba(0.06, 0.14, 0.18, 0.95);
const CARD_BG_HOVER: Color = Color::srgba(0.1, 0.24, 0.3, 0.98);
const HEADING_COLOR: Color = Color::srgba(0.7, 1.0, 1.0, 1.0);
const TEXT_COLOR: Color = Color::srgba(0.85, 0.9, 0.92, 1.0);
const MUTED_COLOR: Color = Color::srgba(0.6, 0.65, 0.7, 1.0);

/// Clicking a card jumps to this local hour on the card's date.
const CARD_JUMP_HOUR: u32 = 21;

#[derive(Component)]
pub struct ClockText;

#[derive(Component)]
pub struct LocationText;

#[derive(Component)]
pub struct WeatherStatusText;

#[derive(Component)]
pub struct CardContainer;

#[derive(Component)]
pub struct ForecastCard(pub NaiveDate);

pub fn setup_weather_worker(mut commands: Commands, settings: Res<AppSettings>) {
    let channels = start_weather_worker(WeatherSource {
        url: settings.weather_url.clone(),
        api_key: settings.weather_api_key.clone(),
        cache_hours: settings.forecast_cache_hours,
    });
    println!("[INIT] Weather worker started");
    commands.insert_resource(channels);
}

fn text(value: impl Into<String>, size: f32, color: Color) -> impl Bundle {
    (
        Text::new(value),
        TextFont {
            font_size: size,
            ..default()
        },
        TextColor(color),
    )
}

pub fn spawn_dashboard(mut commands: Commands) {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                bottom: Val::Px(0.0),
                left: Val::Px(0.0),
                width: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                padding: UiRect::all(Val::Px(8.0)),
                row_gap: Val::Px(6.0),
                ..default()
            },
            BackgroundColor(PANEL_BG),
            Name::new("Forecast dashboard"),
        ))
        .with_children(|panel| {
            panel
                .spawn(Node {
                    flex_direction: FlexDirection::Row,
                    column_gap: Val::Px(24.0),
                    align_items: AlignItems::Center,
                    ..default()
                })
                .with_children(|header| {
                    header.spawn((text("", 16.0, HEADING_COLOR), ClockText));
                    header.spawn((text("", 16.0, HEADING_COLOR), LocationText));
                    header.spawn((text("", 13.0, MUTED_COLOR), WeatherStatusText));
                });

            panel.spawn((
                Node {
                    flex_direction: FlexDirection::Row,
                    flex_wrap: FlexWrap::Wrap,
                    column_gap: Val::Px(6.0),
                    row_gap: Val::Px(6.0),
                    ..default()
                },
                CardContainer,
            ));
        });
}

/// Header clock, refreshed once per wall-clock second.
pub fn tick_clock(mut last_second: Local<i64>, mut clocks: Query<&mut Text, With<ClockText>>) {
    let now = chrono::Local::now();
    if now.timestamp() == *last_second {
        return;
    }
    *last_second = now.timestamp();

    let label = now.format("%A %H:%M:%S").to_string();
    for mut text in &mut clocks {
        text.0.clone_from(&label);
    }
}

/// Ask for weather whenever the observer location differs from the last request.
pub fn request_weather(
    observer: Res<ObserverState>,
    mut state: ResMut<DashboardState>,
    channels: Option<Res<WeatherChannels>>,
) {
    let Some(channels) = channels else { return };
    let location = (observer.latitude, observer.longitude);
    if state.requested_for == Some(location) {
        return;
    }

    state.requested_for = Some(location);
    state.is_loading = true;
    let _ = channels.cmd_tx.send(WeatherCommand::Fetch {
        latitude: location.0,
        longitude: location.1,
    });
}

pub fn apply_weather_results(
    mut state: ResMut<DashboardState>,
    channels: Option<Res<WeatherChannels>>,
) {
    let Some(channels) = channels else { return };
    let Ok(guard) = channels.res_rx.lock() else {
        return;
    };

    while let Ok(msg) = guard.try_recv() {
        match msg {
            WeatherResult::Forecast {
                latitude,
                longitude,
                days,
                from_cache,
            } => {
                if !state.is_current(latitude, longitude) {
                    debug!("Dropping stale forecast for {:.2}, {:.2}", latitude, longitude);
                    continue;
                }
                if from_cache {
                    info!("Weather service unreachable, using cached forecast");
                }
                state.weather = days;
                state.weather_error = None;
                state.from_cache = from_cache;
                state.is_loading = false;
            }
            WeatherResult::Error {
                latitude,
                longitude,
                error,
            } => {
                if !state.is_current(latitude, longitude) {
                    continue;
                }
                warn!("Weather data not available: {}", error);
                state.weather.clear();
                state.weather_error = Some(error);
                state.from_cache = false;
                state.is_loading = false;
            }
        }
    }
}

/// Rebuild cards when the weather, the location or the calendar day changes.
pub fn rebuild_forecast(
    observer: Res<ObserverState>,
    settings: Res<AppSettings>,
    ephemeris: Res<LowPrecisionEphemeris>,
    state: Res<DashboardState>,
    mut cards: ResMut<ForecastCards>,
    mut built_for: Local<Option<(NaiveDate, f64, f64)>>,
) {
    let today = chrono::Local::now().date_naive();
    let key = (today, observer.latitude, observer.longitude);
    if !state.is_changed() && *built_for == Some(key) {
        return;
    }
    *built_for = Some(key);

    match build_forecast(
        &ephemeris,
        today,
        &observer.observer(),
        &state.weather,
        &settings,
    ) {
        Ok(days) => cards.0 = days,
        Err(err) => error!("Could not build forecast cards: {}", err),
    }
}

fn card_lines(day: &ForecastDay) -> [(&'static str, String); 5] {
    let planets = if day.visible_planets.is_empty() {
        "None".to_string()
    } else {
        day.visible_planets.join(", ")
    };
    [
        ("Sunset", day.sunset.clone()),
        ("Moon Phase", day.moon_phase.to_string()),
        ("Visible Planets", planets),
        ("Temperature", day.temperature.clone()),
        ("Clear Sky", day.clear_sky.clone()),
    ]
}

pub fn render_cards(
    mut commands: Commands,
    cards: Res<ForecastCards>,
    containers: Query<Entity, With<CardContainer>>,
) {
    if !cards.is_changed() {
        return;
    }
    let Ok(container) = containers.single() else {
        return;
    };

    commands
        .entity(container)
        .despawn_related::<Children>()
        .with_children(|row| {
            for day in &cards.0 {
                row.spawn((
                    Button,
                    Node {
                        width: Val::Px(170.0),
                        flex_direction: FlexDirection::Column,
                        padding: UiRect::all(Val::Px(6.0)),
                        row_gap: Val::Px(2.0),
                        ..default()
                    },
                    BackgroundColor(CARD_BG),
                    ForecastCard(day.date),
                ))
                .with_children(|card| {
                    card.spawn(text(
                        day.date.format("%A %-d %B").to_string(),
                        14.0,
                        HEADING_COLOR,
                    ));
                    for (name, value) in card_lines(day) {
                        card.spawn(text(format!("{name}: {value}"), 12.0, TEXT_COLOR));
                    }
                });
            }
        });
}

pub fn handle_card_clicks(
    mut cards: Query<(&Interaction, &ForecastCard, &mut BackgroundColor), Changed<Interaction>>,
    mut observer: ResMut<ObserverState>,
) {
    for (interaction, ForecastCard(date), mut background) in &mut cards {
        match interaction {
            Interaction::Pressed => {
                let Some(jump) = NaiveTime::from_hms_opt(CARD_JUMP_HOUR, 0, 0) else {
                    continue;
                };
                info!("Jumping to {} {:02}:00", date, CARD_JUMP_HOUR);
                observer.local = date.and_time(jump);
            }
            Interaction::Hovered => background.0 = CARD_BG_HOVER,
            Interaction::None => background.0 = CARD_BG,
        }
    }
}

pub fn update_header(
    observer: Res<ObserverState>,
    state: Res<DashboardState>,
    mut locations: Query<&mut Text, (With<LocationText>, Without<WeatherStatusText>)>,
    mut statuses: Query<&mut Text, (With<WeatherStatusText>, Without<LocationText>)>,
) {
    if !observer.is_changed() && !state.is_changed() {
        return;
    }

    for mut text in &mut locations {
        text.0 = format!("Lat: {:.2}, Lon: {:.2}", observer.latitude, observer.longitude);
    }
    let status = weather_status(&state);
    for mut text in &mut statuses {
        text.0.clone_from(&status);
    }
}

fn weather_status(state: &DashboardState) -> String {
    if state.is_loading {
        "Loading weather...".to_string()
    } else if let Some(error) = &state.weather_error {
        format!("Weather unavailable: {error}")
    } else if state.from_cache {
        "Cached weather".to_string()
    } else {
        String::new()
    }
}
