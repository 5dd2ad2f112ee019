//! Bevy systems driving the sky scene.

use bevy::picking::events::{Out, Over, Pointer};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use super::backend::{BodyLabel, CommandsBackend};
use super::sync::SkyScene;
use super::textures::{PendingTexture, TextureState};
use crate::config::AppSettings;
use crate::ephemeris::LowPrecisionEphemeris;
use crate::observer::ObserverState;

/// Root node of the hover tooltip.
#[derive(Component)]
pub struct BodyTooltip;

/// Entity currently under the pointer, if it carries a label.
#[derive(Resource, Default)]
pub struct HoveredBody(pub Option<Entity>);

/// Re-run the synchronizer whenever the observer moves in space or time.
pub fn sync_sky_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    asset_server: Res<AssetServer>,
    settings: Res<AppSettings>,
    ephemeris: Res<LowPrecisionEphemeris>,
    observer: Res<ObserverState>,
    mut scene: ResMut<SkyScene>,
) {
    let mut backend = CommandsBackend {
        commands: &mut commands,
        meshes: &mut meshes,
        materials: &mut materials,
        asset_server: &asset_server,
        light_illuminance: settings.sun_illuminance,
    };

    match scene.synchronize(&*ephemeris, &mut backend, &observer.observer(), observer.utc()) {
        Ok(report) => {
            if let Some(sun) = report.sun {
                debug!(
                    "Sky synced for {}: sun alt {:.1} az {:.1}, created {:?}, shown {:?}, hidden {:?}",
                    observer.local, sun.altitude, sun.azimuth, report.created, report.shown,
                    report.hidden
                );
            }
        }
        Err(err) => error!("Sky synchronization failed, keeping previous scene: {}", err),
    }
}

/// Attach textures to their spheres once the asset server has them.
pub fn apply_loaded_textures(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut scene: ResMut<SkyScene>,
    pending: Query<(Entity, &PendingTexture, &MeshMaterial3d<StandardMaterial>)>,
) {
    for (entity, texture, material3d) in &pending {
        let Some(state) = asset_server.get_load_state(texture.handle.id()) else {
            continue;
        };

        if state.is_loaded() {
            if let Some(material) = materials.get_mut(&material3d.0) {
                material.base_color_texture = Some(texture.handle.clone());
            }
            if scene.textures.state(texture.key) != Some(TextureState::Ready) {
                info!("Texture ready: {}", texture.key);
                scene.textures.mark(texture.key, TextureState::Ready);
            }
            commands.entity(entity).remove::<PendingTexture>();
        } else if state.is_failed() {
            if scene.textures.state(texture.key) != Some(TextureState::Failed) {
                warn!("Texture for {} failed to load, rendering untextured", texture.key);
                scene.textures.mark(texture.key, TextureState::Failed);
            }
            commands.entity(entity).remove::<PendingTexture>();
        }
    }
}

pub fn spawn_tooltip(mut commands: Commands) {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                padding: UiRect::axes(Val::Px(8.0), Val::Px(4.0)),
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.75)),
            Visibility::Hidden,
            GlobalZIndex(10),
            BodyTooltip,
        ))
        .with_child((
            Text::new(""),
            TextFont {
                font_size: 14.0,
                ..default()
            },
            TextColor(Color::WHITE),
        ));
}

pub fn track_hovered_body(
    mut over_events: MessageReader<Pointer<Over>>,
    mut out_events: MessageReader<Pointer<Out>>,
    labels: Query<(), With<BodyLabel>>,
    mut hovered: ResMut<HoveredBody>,
) {
    for ev in out_events.read() {
        if hovered.0 == Some(ev.entity) {
            hovered.0 = None;
        }
    }
    for ev in over_events.read() {
        if labels.contains(ev.entity) {
            hovered.0 = Some(ev.entity);
        }
    }
}

pub fn update_tooltip(
    hovered: Res<HoveredBody>,
    windows: Query<&Window, With<PrimaryWindow>>,
    labels: Query<(&BodyLabel, &InheritedVisibility)>,
    mut tooltip: Query<(&mut Node, &mut Visibility, &Children), With<BodyTooltip>>,
    mut texts: Query<&mut Text>,
) {
    let Ok((mut node, mut visibility, children)) = tooltip.single_mut() else {
        return;
    };

    let target = hovered
        .0
        .and_then(|entity| labels.get(entity).ok())
        .filter(|(_, inherited)| inherited.get());
    let cursor = windows.single().ok().and_then(|w| w.cursor_position());

    let (Some((label, _)), Some(cursor)) = (target, cursor) else {
        *visibility = Visibility::Hidden;
        return;
    };

    node.left = Val::Px(cursor.x + 12.0);
    node.top = Val::Px(cursor.y + 12.0);
    *visibility = Visibility::Inherited;
    for child in children.iter() {
        if let Ok(mut text) = texts.get_mut(child)
            && text.0 != label.0
        {
            text.0 = label.0.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::CoordinateSource;
    use crate::sky::backend::testing::RecordingBackend;
    use crate::sky::backend::{RING_TILT, SkyLight};
    use crate::sky::registry::{SATELLITE_TEXTURE_KEY, descriptor_for};
    use crate::sky::store::{VisualEntry, satellite_position};
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
    use std::time::Duration;

    const LATITUDE: f64 = 0.0;
    const LONGITUDE: f64 = 0.0;
    const EPSILON: f32 = 1e-4;

    fn saturn_altitude(local: NaiveDateTime) -> f64 {
        let state = ObserverState::new(LATITUDE, LONGITUDE, local);
        LowPrecisionEphemeris::default()
            .horizon_of("Saturn", state.utc(), &state.observer())
            .expect("instant within the supported range")
            .altitude
    }

    /// First whole hour after `from` where Saturn's altitude passes `accept`.
    fn next_hour_where(from: NaiveDateTime, accept: impl Fn(f64) -> bool) -> NaiveDateTime {
        (1..=72)
            .map(|hours| from + TimeDelta::hours(hours))
            .find(|&local| accept(saturn_altitude(local)))
            .expect("Saturn rises and sets within three days")
    }

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 21)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn sky_app(local: NaiveDateTime) -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Mesh>()
            .init_asset::<StandardMaterial>()
            .init_asset::<Image>()
            .insert_resource(AppSettings::default())
            .insert_resource(ObserverState::new(LATITUDE, LONGITUDE, local))
            .init_resource::<LowPrecisionEphemeris>()
            .init_resource::<SkyScene>()
            .add_systems(
                Update,
                (
                    sync_sky_scene.run_if(resource_changed::<ObserverState>),
                    apply_loaded_textures,
                )
                    .chain(),
            );
        app
    }

    fn set_local(app: &mut App, local: NaiveDateTime) {
        app.world_mut().resource_mut::<ObserverState>().local = local;
    }

    fn sky_light_count(app: &mut App) -> usize {
        let mut lights = app
            .world_mut()
            .query_filtered::<&DirectionalLight, With<SkyLight>>();
        lights.iter(app.world()).count()
    }

    fn pending_count(app: &mut App) -> usize {
        let mut pending = app.world_mut().query::<&PendingTexture>();
        pending.iter(app.world()).count()
    }

    fn saturn_entry(app: &App) -> VisualEntry {
        app.world()
            .resource::<SkyScene>()
            .store
            .entry_for("Saturn")
            .cloned()
            .expect("Saturn has a visual entry")
    }

    fn all_objects(entry: &VisualEntry) -> Vec<Entity> {
        std::iter::once(entry.primary)
            .chain(entry.ring)
            .chain(entry.satellites.iter().copied())
            .collect()
    }

    fn visibility(app: &App, entity: Entity) -> Option<Visibility> {
        app.world().get::<Visibility>(entity).copied()
    }

    fn translation(app: &App, entity: Entity) -> Vec3 {
        app.world()
            .get::<Transform>(entity)
            .map(|t| t.translation)
            .expect("sky object has a transform")
    }

    #[test]
    fn test_sync_system_keeps_one_light_and_hides_set_bodies() {
        let risen = next_hour_where(start(), |alt| alt > 5.0);
        let set = next_hour_where(risen, |alt| alt < -5.0);
        let risen_again = next_hour_where(set, |alt| alt > 5.0);

        let mut app = sky_app(risen);
        app.update();
        assert_eq!(sky_light_count(&mut app), 1);
        let first = saturn_entry(&app);
        assert!(first.ring.is_some());
        assert_eq!(first.satellites.len(), 4);
        for entity in all_objects(&first) {
            assert_eq!(visibility(&app, entity), Some(Visibility::Inherited));
        }

        // No observer change, no sync.
        app.update();
        assert_eq!(sky_light_count(&mut app), 1);

        set_local(&mut app, set);
        app.update();
        assert_eq!(sky_light_count(&mut app), 1);
        let hidden = saturn_entry(&app);
        assert!(!hidden.visible);
        assert_eq!(all_objects(&hidden), all_objects(&first));
        for entity in all_objects(&hidden) {
            assert_eq!(visibility(&app, entity), Some(Visibility::Hidden));
        }

        set_local(&mut app, risen_again);
        app.update();
        assert_eq!(sky_light_count(&mut app), 1);
        let shown = saturn_entry(&app);
        assert_eq!(all_objects(&shown), all_objects(&first));
        assert!((shown.center - first.center).length() > EPSILON);
        for entity in all_objects(&shown) {
            assert_eq!(visibility(&app, entity), Some(Visibility::Inherited));
        }

        assert!((translation(&app, shown.primary) - shown.center).length() < EPSILON);
        let ring = shown.ring.expect("Saturn keeps its ring");
        assert!((translation(&app, ring) - shown.center).length() < EPSILON);
        let ring_rotation = app.world().get::<Transform>(ring).map(|t| t.rotation);
        assert_eq!(ring_rotation, Some(Quat::from_rotation_x(RING_TILT)));
        for (i, &satellite) in shown.satellites.iter().enumerate() {
            let expected = satellite_position(shown.center, shown.size, i, 4);
            assert!((translation(&app, satellite) - expected).length() < EPSILON);
        }
    }

    #[test]
    fn test_missing_texture_fails_once_and_is_not_reloaded() {
        let risen = next_hour_where(start(), |alt| alt > 5.0);
        let mut app = sky_app(risen);
        app.update();
        assert!(pending_count(&mut app) > 0);

        // Nothing is bundled under assets/, so every load ends up failed.
        for _ in 0..500 {
            if pending_count(&mut app) == 0 {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
            app.update();
        }
        assert_eq!(pending_count(&mut app), 0);

        let scene = app.world().resource::<SkyScene>();
        assert_eq!(scene.textures.state("Saturn"), Some(TextureState::Failed));
        assert_eq!(
            scene.textures.state(SATELLITE_TEXTURE_KEY),
            Some(TextureState::Failed)
        );

        let saturn = saturn_entry(&app);
        let material = app
            .world()
            .get::<MeshMaterial3d<StandardMaterial>>(saturn.primary)
            .map(|m| m.0.clone())
            .expect("sphere has a material");
        let materials = app.world().resource::<Assets<StandardMaterial>>();
        assert!(materials.get(&material).is_some_and(|m| m.base_color_texture.is_none()));

        // A resync at the same instant attaches nothing new.
        app.world_mut().resource_mut::<ObserverState>().set_changed();
        app.update();
        assert_eq!(pending_count(&mut app), 0);
        assert_eq!(sky_light_count(&mut app), 1);

        let observer = app.world().resource::<ObserverState>().clone();
        let mut backend = RecordingBackend::default();
        let mut scene = app.world_mut().resource_mut::<SkyScene>();
        let report = scene
            .synchronize(
                &LowPrecisionEphemeris::default(),
                &mut backend,
                &observer.observer(),
                observer.utc(),
            )
            .unwrap();
        assert!(report.created.is_empty());
        assert!(report.shown.contains(&"Saturn"));
        let saturn_path = descriptor_for("Saturn").and_then(|d| d.texture);
        let moon_path = descriptor_for(SATELLITE_TEXTURE_KEY).and_then(|d| d.texture);
        assert!(saturn_path.is_some() && moon_path.is_some());
        assert!(
            backend
                .texture_loads
                .iter()
                .all(|path| Some(*path) != saturn_path && Some(*path) != moon_path)
        );
    }
}
