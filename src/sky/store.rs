//! Scene state: which bodies have been drawn, and the one sun light.

use bevy::prelude::*;
use std::collections::BTreeMap;
use std::f32::consts::TAU;

use super::backend::{RingSpec, SceneBackend, SphereSpec};
use super::registry::{
    BodyDescriptor, RING_INNER_FACTOR, RING_OUTER_FACTOR, SATELLITE_ORBIT_FACTOR,
    SATELLITE_RADIUS, SATELLITE_TEXTURE_KEY, descriptor_for,
};
use super::textures::TextureCache;

/// Renderable objects for one body.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualEntry {
    pub primary: Entity,
    pub ring: Option<Entity>,
    /// Fixed at creation to the descriptor's satellite count.
    pub satellites: Vec<Entity>,
    pub visible: bool,
    pub center: Vec3,
    /// Primary radius, kept to recompute satellite orbits.
    pub size: f32,
}

impl VisualEntry {
    fn objects(&self) -> impl Iterator<Item = Entity> + '_ {
        std::iter::once(self.primary)
            .chain(self.ring)
            .chain(self.satellites.iter().copied())
    }
}

/// Per-body tracking state. Once tracked, a body never becomes unseen again.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum BodyTrack {
    #[default]
    Unseen,
    Tracked(VisualEntry),
}

/// Position of satellite `index` of `count` around `center`.
pub fn satellite_position(center: Vec3, size: f32, index: usize, count: usize) -> Vec3 {
    let angle = TAU * index as f32 / count as f32;
    let radius = size * SATELLITE_ORBIT_FACTOR;
    center + Vec3::new(radius * angle.cos(), 0.0, radius * angle.sin())
}

#[derive(Default)]
pub struct SceneStore {
    tracks: BTreeMap<&'static str, BodyTrack>,
    light: Option<Entity>,
}

impl SceneStore {
    pub fn entry_for(&self, name: &str) -> Option<&VisualEntry> {
        match self.tracks.get(name) {
            Some(BodyTrack::Tracked(entry)) => Some(entry),
            _ => None,
        }
    }

    pub fn track(&self, name: &str) -> &BodyTrack {
        static UNSEEN: BodyTrack = BodyTrack::Unseen;
        self.tracks.get(name).unwrap_or(&UNSEEN)
    }

    /// Names of every body with a visual entry.
    pub fn tracked_names(&self) -> Vec<&'static str> {
        self.tracks
            .iter()
            .filter(|(_, track)| matches!(track, BodyTrack::Tracked(_)))
            .map(|(name, _)| *name)
            .collect()
    }

    pub fn light(&self) -> Option<Entity> {
        self.light
    }

    /// Spawn the primary, optional ring and satellites for `name`, visible.
    ///
    /// # Panics
    /// If `name` already has an entry.
    pub fn create_entry(
        &mut self,
        backend: &mut impl SceneBackend,
        name: &'static str,
        descriptor: &BodyDescriptor,
        position: Vec3,
        textures: &mut TextureCache,
    ) -> &VisualEntry {
        assert!(
            self.entry_for(name).is_none(),
            "visual entry for {name} created twice"
        );

        let texture = descriptor
            .texture
            .map(|path| textures.request(name, path, backend));
        let primary = backend.spawn_sphere(SphereSpec {
            label: name.to_string(),
            radius: descriptor.size,
            translation: position,
            texture,
            unlit: descriptor.self_luminous,
        });

        let ring = descriptor.has_ring.then(|| {
            backend.spawn_ring(RingSpec {
                label: format!("{name} Rings"),
                inner_radius: descriptor.size * RING_INNER_FACTOR,
                outer_radius: descriptor.size * RING_OUTER_FACTOR,
                translation: position,
            })
        });

        let count = descriptor.satellites.len();
        let moon_texture = descriptor_for(SATELLITE_TEXTURE_KEY)
            .and_then(|d| d.texture);
        let satellites = descriptor
            .satellites
            .iter()
            .enumerate()
            .map(|(i, satellite)| {
                let texture = moon_texture
                    .map(|path| textures.request(SATELLITE_TEXTURE_KEY, path, backend));
                backend.spawn_sphere(SphereSpec {
                    label: satellite.to_string(),
                    radius: SATELLITE_RADIUS,
                    translation: satellite_position(position, descriptor.size, i, count),
                    texture,
                    unlit: false,
                })
            })
            .collect();

        let entry = VisualEntry {
            primary,
            ring,
            satellites,
            visible: true,
            center: position,
            size: descriptor.size,
        };
        let track = self.tracks.entry(name).or_default();
        *track = BodyTrack::Tracked(entry);
        let BodyTrack::Tracked(entry) = track else {
            unreachable!("entry for {name} was just inserted");
        };
        entry
    }

    /// Show or hide every object of `name`. Unseen bodies are left alone.
    pub fn set_visible(&mut self, backend: &mut impl SceneBackend, name: &str, visible: bool) {
        let Some(BodyTrack::Tracked(entry)) = self.tracks.get_mut(name) else {
            return;
        };
        entry.visible = visible;
        for entity in entry.objects() {
            backend.set_visible(entity, visible);
        }
    }

    /// Move the primary and ring to `position` and re-place the satellites around it.
    pub fn reposition(&mut self, backend: &mut impl SceneBackend, name: &str, position: Vec3) {
        let Some(BodyTrack::Tracked(entry)) = self.tracks.get_mut(name) else {
            return;
        };
        entry.center = position;
        backend.set_translation(entry.primary, position);
        if let Some(ring) = entry.ring {
            backend.set_translation(ring, position);
        }
        let count = entry.satellites.len();
        for (i, &satellite) in entry.satellites.iter().enumerate() {
            backend.set_translation(satellite, satellite_position(position, entry.size, i, count));
        }
    }

    /// Despawn the previous light (if any) and install a new one along `direction`.
    pub fn replace_light(&mut self, backend: &mut impl SceneBackend, direction: Vec3) -> Entity {
        if let Some(old) = self.light.take() {
            backend.despawn(old);
        }
        let light = backend.spawn_light(direction);
        self.light = Some(light);
        light
    }
}
