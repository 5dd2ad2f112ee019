// 3D sky map of the Sun, Moon and naked-eye planets above the observer's horizon.

use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::light::GlobalAmbientLight;
use bevy::picking::Pickable;
use bevy::picking::prelude::*;
use bevy::prelude::*;
use bevy::window::{PresentMode, Window, WindowPlugin};

use bevy_panorbit_camera::{PanOrbitCamera, PanOrbitCameraPlugin};

#[cfg(feature = "dev")]
use bevy::dev_tools::fps_overlay::FpsOverlayPlugin;

mod config;
mod core;
mod dashboard;
mod ephemeris;
mod observer;
mod sky;

use config::AppSettings;
use dashboard::DashboardPlugin;
use observer::ObserverPlugin;
use sky::SkyPlugin;

/// Camera distance from the origin; the horizon ring sits just inside it.
const CAMERA_DISTANCE: f32 = 5.0;
const HORIZON_INNER: f32 = 4.9;
const HORIZON_OUTER: f32 = 5.0;

pub fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    settings: Res<AppSettings>,
) {
    // Unlit bodies stay visible at night, lit ones need some fill.
    commands.insert_resource(GlobalAmbientLight {
        brightness: settings.ambient_brightness,
        ..default()
    });

    commands.spawn((
        Camera3d::default(),
        Camera {
            clear_color: ClearColorConfig::Custom(Color::BLACK),
            ..default()
        },
        PanOrbitCamera {
            focus: Vec3::ZERO,
            radius: Some(CAMERA_DISTANCE),
            force_update: true,
            ..default()
        },
        Tonemapping::TonyMcMapface,
        Transform::from_xyz(0.0, 0.0, CAMERA_DISTANCE).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        Mesh3d(meshes.add(Annulus::new(HORIZON_INNER, HORIZON_OUTER))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb_u8(0x22, 0x22, 0x22),
            unlit: true,
            double_sided: true,
            cull_mode: None,
            ..default()
        })),
        Transform::from_rotation(Quat::from_rotation_x(std::f32::consts::FRAC_PI_2)),
        Pickable::IGNORE,
        Name::new("Horizon"),
    ));
}

fn main() {
    let mut app = App::new();

    app.insert_resource(AppSettings::load());

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Bevy Sky".to_string(),
            present_mode: PresentMode::AutoVsync,
            ..default()
        }),
        ..default()
    }));

    #[cfg(feature = "dev")]
    app.add_plugins(FpsOverlayPlugin::default());

    app.add_plugins(PanOrbitCameraPlugin);
    app.add_plugins(MeshPickingPlugin);

    app.add_plugins(ObserverPlugin);
    app.add_plugins(SkyPlugin);
    app.add_plugins(DashboardPlugin);

    app.insert_resource(ClearColor(Color::BLACK));
    app.add_systems(Startup, setup);

    app.run();
}
