//! Per-body texture cache.
//!
//! Each key is loaded at most once. Completion is reported back through the
//! [`PendingTexture`] component on the sphere that asked for it, so a despawned
//! body simply takes its pending request with it.

use bevy::prelude::*;
use std::collections::HashMap;

use super::backend::SceneBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureState {
    Pending,
    Ready,
    Failed,
}

#[derive(Debug, Clone)]
pub struct TextureSlot {
    pub handle: Handle<Image>,
    pub state: TextureState,
}

/// Texture waiting to be applied to the material of the entity carrying it.
#[derive(Component, Debug, Clone)]
pub struct PendingTexture {
    pub key: &'static str,
    pub handle: Handle<Image>,
}

#[derive(Default)]
pub struct TextureCache {
    slots: HashMap<&'static str, TextureSlot>,
}

impl TextureCache {
    /// Handle for `key`, starting the load through `backend` on first use.
    pub fn request(
        &mut self,
        key: &'static str,
        path: &'static str,
        backend: &mut impl SceneBackend,
    ) -> PendingTexture {
        let slot = self.slots.entry(key).or_insert_with(|| TextureSlot {
            handle: backend.load_texture(path),
            state: TextureState::Pending,
        });
        PendingTexture {
            key,
            handle: slot.handle.clone(),
        }
    }

    pub fn state(&self, key: &str) -> Option<TextureState> {
        self.slots.get(key).map(|slot| slot.state)
    }

    pub fn mark(&mut self, key: &str, state: TextureState) {
        if let Some(slot) = self.slots.get_mut(key) {
            slot.state = state;
        }
    }
}
