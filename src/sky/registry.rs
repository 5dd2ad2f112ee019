//! Static table of the bodies drawn on the sky dome.
//!
//! Sizes and distances are artistic: every body sits on a shell a few units
//! from the camera, far enough apart that they never overlap.

/// Radius of every moon sphere.
pub const SATELLITE_RADIUS: f32 = 0.02;
/// Moons circle their primary at `size * SATELLITE_ORBIT_FACTOR`.
pub const SATELLITE_ORBIT_FACTOR: f32 = 3.0;
/// Ring inner/outer radii as multiples of the primary's size.
pub const RING_INNER_FACTOR: f32 = 1.5;
pub const RING_OUTER_FACTOR: f32 = 2.0;
/// Radius used only to derive the sun light direction.
pub const LIGHT_BASE_RADIUS: f32 = 4.0;
/// Distance for bodies missing from the table.
pub const DEFAULT_DISTANCE: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDescriptor {
    pub name: &'static str,
    /// Display radius in world units.
    pub size: f32,
    /// Artistic distance from the observer.
    pub distance: f32,
    pub satellites: &'static [&'static str],
    pub has_ring: bool,
    /// Asset path, relative to the assets folder.
    pub texture: Option<&'static str>,
    /// Rendered unlit (the Sun).
    pub self_luminous: bool,
}

impl BodyDescriptor {
    /// Descriptor used for names that are not in the registry.
    pub const fn fallback() -> Self {
        Self {
            name: "",
            size: 0.1,
            distance: DEFAULT_DISTANCE,
            satellites: &[],
            has_ring: false,
            texture: None,
            self_luminous: false,
        }
    }
}

pub static BODY_REGISTRY: [BodyDescriptor; 7] = [
    BodyDescriptor {
        name: "Sun",
        size: 0.5,
        distance: 4.0,
        satellites: &[],
        has_ring: false,
        texture: Some("textures/2k_sun.jpg"),
        self_luminous: true,
    },
    BodyDescriptor {
        name: "Mercury",
        size: 0.05,
        distance: 4.2,
        satellites: &[],
        has_ring: false,
        texture: Some("textures/2k_mercury.jpg"),
        self_luminous: false,
    },
    BodyDescriptor {
        name: "Venus",
        size: 0.1,
        distance: 4.3,
        satellites: &[],
        has_ring: false,
        texture: Some("textures/2k_venus_surface.jpg"),
        self_luminous: false,
    },
    BodyDescriptor {
        name: "Mars",
        size: 0.08,
        distance: 4.5,
        satellites: &["Phobos", "Deimos"],
        has_ring: false,
        texture: Some("textures/2k_mars.jpg"),
        self_luminous: false,
    },
    BodyDescriptor {
        name: "Jupiter",
        size: 0.15,
        distance: 5.0,
        satellites: &["Io", "Europa", "Ganymede", "Callisto"],
        has_ring: false,
        texture: Some("textures/2k_jupiter.jpg"),
        self_luminous: false,
    },
    BodyDescriptor {
        name: "Saturn",
        size: 0.12,
        distance: 5.2,
        satellites: &["Titan", "Rhea", "Iapetus", "Dione"],
        has_ring: true,
        texture: Some("textures/2k_saturn.jpg"),
        self_luminous: false,
    },
    BodyDescriptor {
        name: "Moon",
        size: 0.3,
        distance: 3.6,
        satellites: &[],
        has_ring: false,
        texture: Some("textures/2k_moon.jpg"),
        self_luminous: false,
    },
];

/// Texture key shared by every satellite sphere.
pub const SATELLITE_TEXTURE_KEY: &str = "Moon";

pub fn descriptor_for(name: &str) -> Option<&'static BodyDescriptor> {
    BODY_REGISTRY.iter().find(|d| d.name == name)
}

pub fn distance_for(name: &str) -> f32 {
    descriptor_for(name).map_or(DEFAULT_DISTANCE, |d| d.distance)
}
