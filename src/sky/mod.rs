//! Sky scene: bodies above the horizon placed on an artistic dome around the camera.

use bevy::prelude::*;

pub mod backend;
pub mod registry;
pub mod store;
pub mod sync;
pub mod systems;
pub mod textures;

use crate::ephemeris::LowPrecisionEphemeris;
use crate::observer::ObserverState;

pub struct SkyPlugin;

impl Plugin for SkyPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<sync::SkyScene>()
            .init_resource::<LowPrecisionEphemeris>()
            .init_resource::<systems::HoveredBody>()
            .add_systems(Startup, systems::spawn_tooltip)
            .add_systems(
                Update,
                (
                    systems::sync_sky_scene.run_if(resource_changed::<ObserverState>),
                    systems::apply_loaded_textures,
                    systems::track_hovered_body,
                    systems::update_tooltip,
                )
                    .chain(),
            );
    }
}
