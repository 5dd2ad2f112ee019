//! Rendering seam for the sky scene.
//!
//! The store only ever talks to a [`SceneBackend`]. The Bevy implementation
//! queues entity commands; tests use a recording backend instead.

use bevy::prelude::*;
use std::f32::consts::FRAC_PI_3;

use super::textures::PendingTexture;

/// Hover label carried by every sky object.
#[derive(Component, Debug, Clone)]
pub struct BodyLabel(pub String);

/// Marker for the single sun light owned by the store.
#[derive(Component)]
pub struct SkyLight;

#[derive(Debug, Clone)]
pub struct SphereSpec {
    pub label: String,
    pub radius: f32,
    pub translation: Vec3,
    pub texture: Option<PendingTexture>,
    pub unlit: bool,
}

#[derive(Debug, Clone)]
pub struct RingSpec {
    pub label: String,
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub translation: Vec3,
}

pub trait SceneBackend {
    fn load_texture(&mut self, path: &'static str) -> Handle<Image>;
    fn spawn_sphere(&mut self, spec: SphereSpec) -> Entity;
    fn spawn_ring(&mut self, spec: RingSpec) -> Entity;
    /// Spawn a directional light shining from `direction` toward the origin.
    fn spawn_light(&mut self, direction: Vec3) -> Entity;
    fn set_translation(&mut self, entity: Entity, translation: Vec3);
    fn set_visible(&mut self, entity: Entity, visible: bool);
    fn despawn(&mut self, entity: Entity);
}

/// Ring tilt about the X axis.
pub const RING_TILT: f32 = FRAC_PI_3;

const RING_COLOR: Color = Color::srgba(0.812, 0.780, 0.698, 0.8);

pub struct CommandsBackend<'a, 'w, 's> {
    pub commands: &'a mut Commands<'w, 's>,
    pub meshes: &'a mut Assets<Mesh>,
    pub materials: &'a mut Assets<StandardMaterial>,
    pub asset_server: &'a AssetServer,
    pub light_illuminance: f32,
}

impl SceneBackend for CommandsBackend<'_, '_, '_> {
    fn load_texture(&mut self, path: &'static str) -> Handle<Image> {
        self.asset_server.load(path)
    }

    fn spawn_sphere(&mut self, spec: SphereSpec) -> Entity {
        let mesh = self.meshes.add(Sphere::new(spec.radius).mesh().uv(32, 18));
        // Texture is attached once the image finishes loading.
        let material = self.materials.add(StandardMaterial {
            base_color: Color::WHITE,
            unlit: spec.unlit,
            perceptual_roughness: 0.9,
            ..default()
        });

        let mut entity = self.commands.spawn((
            Mesh3d(mesh),
            MeshMaterial3d(material),
            Transform::from_translation(spec.translation),
            Visibility::Inherited,
            Name::new(spec.label.clone()),
            BodyLabel(spec.label),
        ));
        if let Some(texture) = spec.texture {
            entity.insert(texture);
        }
        entity.id()
    }

    fn spawn_ring(&mut self, spec: RingSpec) -> Entity {
        let mesh = self
            .meshes
            .add(Annulus::new(spec.inner_radius, spec.outer_radius));
        let material = self.materials.add(StandardMaterial {
            base_color: RING_COLOR,
            alpha_mode: AlphaMode::Blend,
            double_sided: true,
            cull_mode: None,
            ..default()
        });

        self.commands
            .spawn((
                Mesh3d(mesh),
                MeshMaterial3d(material),
                Transform::from_translation(spec.translation)
                    .with_rotation(Quat::from_rotation_x(RING_TILT)),
                Visibility::Inherited,
                Name::new(spec.label.clone()),
                BodyLabel(spec.label),
            ))
            .id()
    }

    fn spawn_light(&mut self, direction: Vec3) -> Entity {
        let position = direction.normalize_or(Vec3::Y);
        self.commands
            .spawn((
                DirectionalLight {
                    illuminance: self.light_illuminance,
                    ..default()
                },
                SkyLight,
                Transform::from_translation(position).looking_at(Vec3::ZERO, Vec3::Y),
            ))
            .id()
    }

    fn set_translation(&mut self, entity: Entity, translation: Vec3) {
        self.commands
            .entity(entity)
            .entry::<Transform>()
            .and_modify(move |mut transform| transform.translation = translation);
    }

    fn set_visible(&mut self, entity: Entity, visible: bool) {
        let visibility = if visible {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
        self.commands.entity(entity).insert(visibility);
    }

    fn despawn(&mut self, entity: Entity) {
        self.commands.entity(entity).despawn();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;

    /// Object recorded by [`RecordingBackend`].
    #[derive(Debug, Clone)]
    pub struct RecordedObject {
        pub label: String,
        pub translation: Vec3,
        pub visible: bool,
        pub texture: Option<&'static str>,
    }

    /// Backend that records every call. Entity ids come from a bare `World`.
    #[derive(Default)]
    pub struct RecordingBackend {
        pub world: World,
        pub objects: HashMap<Entity, RecordedObject>,
        pub lights: HashMap<Entity, Vec3>,
        pub texture_loads: Vec<&'static str>,
        pub despawned: Vec<Entity>,
    }

    impl RecordingBackend {
        pub fn object(&self, entity: Entity) -> &RecordedObject {
            &self.objects[&entity]
        }

        fn record(
            &mut self,
            label: String,
            translation: Vec3,
            texture: Option<&'static str>,
        ) -> Entity {
            let entity = self.world.spawn_empty().id();
            self.objects.insert(
                entity,
                RecordedObject {
                    label,
                    translation,
                    visible: true,
                    texture,
                },
            );
            entity
        }
    }

    impl SceneBackend for RecordingBackend {
        fn load_texture(&mut self, path: &'static str) -> Handle<Image> {
            self.texture_loads.push(path);
            Handle::default()
        }

        fn spawn_sphere(&mut self, spec: SphereSpec) -> Entity {
            let texture = spec.texture.map(|t| t.key);
            self.record(spec.label, spec.translation, texture)
        }

        fn spawn_ring(&mut self, spec: RingSpec) -> Entity {
            self.record(spec.label, spec.translation, None)
        }

        fn spawn_light(&mut self, direction: Vec3) -> Entity {
            let entity = self.world.spawn_empty().id();
            self.lights.insert(entity, direction);
            entity
        }

        fn set_translation(&mut self, entity: Entity, translation: Vec3) {
            if let Some(object) = self.objects.get_mut(&entity) {
                object.translation = translation;
            }
        }

        fn set_visible(&mut self, entity: Entity, visible: bool) {
            if let Some(object) = self.objects.get_mut(&entity) {
                object.visible = visible;
            }
        }

        fn despawn(&mut self, entity: Entity) {
            self.objects.remove(&entity);
            self.lights.remove(&entity);
            self.despawned.push(entity);
        }
    }
}
