//! Per-update synchronization of the sky scene with the ephemeris.

use bevy::prelude::*;
use chrono::{DateTime, Utc};

use super::backend::SceneBackend;
use super::registry::{
    BODY_REGISTRY, BodyDescriptor, LIGHT_BASE_RADIUS, descriptor_for, distance_for,
};
use super::store::{BodyTrack, SceneStore};
use super::textures::TextureCache;
use crate::core::coordinates::horizon_to_cartesian;
use crate::ephemeris::{CoordinateSource, EphemerisError, Observer};

/// Horizon coordinates of one body for one update. Not retained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizonSample {
    pub name: &'static str,
    pub altitude: f64,
    pub azimuth: f64,
}

impl HorizonSample {
    /// Strictly above the horizon.
    pub fn is_visible(&self) -> bool {
        self.altitude > 0.0
    }
}

/// Summary of one synchronization, for logging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub created: Vec<&'static str>,
    pub shown: Vec<&'static str>,
    pub hidden: Vec<&'static str>,
    pub sun: Option<HorizonSample>,
}

/// Owned sky scene state: the visual entries plus their textures.
#[derive(Resource, Default)]
pub struct SkyScene {
    pub store: SceneStore,
    pub textures: TextureCache,
}

impl SkyScene {
    /// Bring the scene in line with the sky seen by `observer` at `at`.
    ///
    /// Every body is sampled before anything is mutated, so an ephemeris
    /// error leaves the scene exactly as it was.
    pub fn synchronize(
        &mut self,
        source: &impl CoordinateSource,
        backend: &mut impl SceneBackend,
        observer: &Observer,
        at: DateTime<Utc>,
    ) -> Result<SyncReport, EphemerisError> {
        let samples = BODY_REGISTRY
            .iter()
            .map(|descriptor| sample(source, descriptor.name, observer, at))
            .collect::<Result<Vec<_>, _>>()?;
        let sun = match samples.iter().find(|s| s.name == "Sun") {
            Some(sun) => *sun,
            None => sample(source, "Sun", observer, at)?,
        };

        let mut report = SyncReport {
            sun: Some(sun),
            ..default()
        };

        let direction = horizon_to_cartesian(sun.altitude, sun.azimuth, LIGHT_BASE_RADIUS);
        self.store.replace_light(backend, direction.normalize_or(Vec3::Y));

        for name in self.store.tracked_names() {
            let visible_now = samples.iter().any(|s| s.name == name && s.is_visible());
            if !visible_now {
                if self.store.entry_for(name).is_some_and(|entry| entry.visible) {
                    report.hidden.push(name);
                }
                self.store.set_visible(backend, name, false);
            }
        }

        for sample in samples.iter().filter(|s| s.is_visible()) {
            let position =
                horizon_to_cartesian(sample.altitude, sample.azimuth, distance_for(sample.name));
            if matches!(self.store.track(sample.name), BodyTrack::Unseen) {
                let descriptor = descriptor_for(sample.name)
                    .copied()
                    .unwrap_or(BodyDescriptor::fallback());
                self.store.create_entry(
                    backend,
                    sample.name,
                    &descriptor,
                    position,
                    &mut self.textures,
                );
                report.created.push(sample.name);
            } else {
                self.store.set_visible(backend, sample.name, true);
                self.store.reposition(backend, sample.name, position);
                report.shown.push(sample.name);
            }
        }

        Ok(report)
    }
}

fn sample(
    source: &impl CoordinateSource,
    name: &'static str,
    observer: &Observer,
    at: DateTime<Utc>,
) -> Result<HorizonSample, EphemerisError> {
    let horizontal = source.horizon_of(name, at, observer)?;
    Ok(HorizonSample {
        name,
        altitude: horizontal.altitude,
        azimuth: horizontal.azimuth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::{Equatorial, Horizontal};
    use crate::sky::backend::testing::RecordingBackend;
    use crate::sky::registry::SATELLITE_ORBIT_FACTOR;
    use chrono::TimeZone;
    use std::collections::HashMap;

    const EPSILON: f32 = 1e-4;

    /// Source that hands back fixed horizon coordinates per body.
    ///
    /// Equatorial coordinates carry the horizon values straight through
    /// (RA = azimuth / 15, Dec = altitude) so `horizon` can map them back.
    #[derive(Default)]
    struct FixedSky {
        bodies: HashMap<&'static str, (f64, f64)>,
        fail: bool,
    }

    impl FixedSky {
        fn with(mut self, name: &'static str, altitude: f64, azimuth: f64) -> Self {
            self.bodies.insert(name, (altitude, azimuth));
            self
        }
    }

    impl CoordinateSource for FixedSky {
        fn equatorial(
            &self,
            body: &str,
            at: DateTime<Utc>,
            _observer: &Observer,
        ) -> Result<Equatorial, EphemerisError> {
            if self.fail {
                return Err(EphemerisError::OutOfRange {
                    at,
                    min: 1000,
                    max: 3000,
                });
            }
            let (altitude, azimuth) = self.bodies.get(body).copied().unwrap_or((-30.0, 0.0));
            Ok(Equatorial {
                right_ascension: azimuth / 15.0,
                declination: altitude,
                distance_km: 1.0,
            })
        }

        fn horizon(
            &self,
            _at: DateTime<Utc>,
            _observer: &Observer,
            equatorial: &Equatorial,
        ) -> Result<Horizontal, EphemerisError> {
            Ok(Horizontal {
                altitude: equatorial.declination,
                azimuth: equatorial.right_ascension * 15.0,
            })
        }
    }

    fn paris() -> Observer {
        Observer::new(48.85, 2.29)
    }

    fn midsummer_evening() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 21, 21, 0, 0).unwrap()
    }

    fn visible_labels(backend: &RecordingBackend) -> Vec<String> {
        let mut labels: Vec<String> = backend
            .objects
            .values()
            .filter(|o| o.visible)
            .map(|o| o.label.clone())
            .collect();
        labels.sort();
        labels
    }

    #[test]
    fn test_sun_only_scenario() {
        let mut scene = SkyScene::default();
        let mut backend = RecordingBackend::default();
        let night = FixedSky::default()
            .with("Sun", -10.0, 300.0)
            .with("Venus", 20.0, 250.0)
            .with("Mars", 0.5, 120.0)
            .with("Saturn", 30.0, 160.0);
        scene
            .synchronize(&night, &mut backend, &paris(), midsummer_evening())
            .unwrap();
        assert_eq!(scene.store.tracked_names(), vec!["Mars", "Saturn", "Venus"]);
        let objects_before = backend.objects.len();

        let sky = FixedSky::default()
            .with("Sun", 10.0, 270.0)
            .with("Venus", -5.0, 250.0)
            .with("Mars", 0.0, 120.0);
        let report = scene
            .synchronize(&sky, &mut backend, &paris(), midsummer_evening())
            .unwrap();

        assert_eq!(report.created, vec!["Sun"]);
        let mut hidden = report.hidden.clone();
        hidden.sort();
        assert_eq!(hidden, vec!["Mars", "Saturn", "Venus"]);
        assert_eq!(visible_labels(&backend), vec!["Sun"]);
        assert_eq!(scene.store.tracked_names(), vec!["Mars", "Saturn", "Sun", "Venus"]);
        // Only the Sun's sphere is new.
        assert_eq!(backend.objects.len(), objects_before + 1);
        assert_eq!(backend.lights.len(), 1);

        let light = scene.store.light().unwrap();
        let expected = horizon_to_cartesian(10.0, 270.0, LIGHT_BASE_RADIUS).normalize();
        assert!((backend.lights[&light] - expected).length() < EPSILON);
        // West lands on +X after the azimuth flip.
        assert!(backend.lights[&light].x > 0.9);
    }

    #[test]
    fn test_sun_setting_hides_existing_entries() {
        let mut scene = SkyScene::default();
        let mut backend = RecordingBackend::default();
        let day = FixedSky::default()
            .with("Sun", 10.0, 270.0)
            .with("Venus", 20.0, 250.0);
        scene
            .synchronize(&day, &mut backend, &paris(), midsummer_evening())
            .unwrap();

        let night = FixedSky::default().with("Sun", -10.0, 300.0);
        let report = scene
            .synchronize(&night, &mut backend, &paris(), midsummer_evening())
            .unwrap();

        assert!(report.created.is_empty());
        assert_eq!(report.hidden, vec!["Sun", "Venus"]);
        assert!(visible_labels(&backend).is_empty());
        assert_eq!(scene.store.tracked_names(), vec!["Sun", "Venus"]);
        assert_eq!(backend.lights.len(), 1);
    }

    #[test]
    fn test_mars_first_appearance() {
        let sky = FixedSky::default().with("Mars", 5.0, 90.0);
        let mut scene = SkyScene::default();
        let mut backend = RecordingBackend::default();

        scene
            .synchronize(&sky, &mut backend, &paris(), midsummer_evening())
            .unwrap();

        let entry = scene.store.entry_for("Mars").unwrap().clone();
        let expected = horizon_to_cartesian(5.0, 90.0, 4.5);
        assert!((entry.center - expected).length() < EPSILON);
        assert!((entry.center.length() - 4.5).abs() < EPSILON);
        assert_eq!(entry.satellites.len(), 2);
        assert!(entry.ring.is_none());

        let phobos = backend.object(entry.satellites[0]);
        let deimos = backend.object(entry.satellites[1]);
        assert_eq!(phobos.label, "Phobos");
        assert_eq!(deimos.label, "Deimos");

        // Opposite sides of Mars, at the orbit radius.
        let a = phobos.translation - entry.center;
        let b = deimos.translation - entry.center;
        assert!((a + b).length() < EPSILON);
        assert!((a.length() - 0.08 * SATELLITE_ORBIT_FACTOR).abs() < EPSILON);
    }

    #[test]
    fn test_entries_are_lazy() {
        let sky = FixedSky::default()
            .with("Sun", 30.0, 180.0)
            .with("Jupiter", 12.0, 140.0);
        let mut scene = SkyScene::default();
        let mut backend = RecordingBackend::default();

        for _ in 0..3 {
            scene
                .synchronize(&sky, &mut backend, &paris(), midsummer_evening())
                .unwrap();
        }

        assert_eq!(scene.store.tracked_names(), vec!["Jupiter", "Sun"]);
        for name in ["Mercury", "Venus", "Mars", "Saturn", "Moon"] {
            assert_eq!(*scene.store.track(name), BodyTrack::Unseen);
        }
    }

    #[test]
    fn test_zero_altitude_is_not_visible() {
        let sky = FixedSky::default()
            .with("Sun", 0.0, 90.0)
            .with("Moon", 0.0, 120.0);
        let mut scene = SkyScene::default();
        let mut backend = RecordingBackend::default();

        let report = scene
            .synchronize(&sky, &mut backend, &paris(), midsummer_evening())
            .unwrap();

        assert!(report.created.is_empty());
        assert!(backend.objects.is_empty());
        // Light is still derived from the Sun.
        assert_eq!(backend.lights.len(), 1);
    }

    #[test]
    fn test_synchronize_is_idempotent() {
        let sky = FixedSky::default()
            .with("Sun", 25.0, 200.0)
            .with("Saturn", 40.0, 160.0)
            .with("Moon", 15.0, 100.0);
        let mut scene = SkyScene::default();
        let mut backend = RecordingBackend::default();

        scene
            .synchronize(&sky, &mut backend, &paris(), midsummer_evening())
            .unwrap();
        let first: Vec<_> = backend
            .objects
            .iter()
            .map(|(e, o)| (*e, o.translation, o.visible))
            .collect();

        let report = scene
            .synchronize(&sky, &mut backend, &paris(), midsummer_evening())
            .unwrap();
        assert!(report.created.is_empty());
        assert_eq!(report.shown.len(), 3);

        for (entity, translation, visible) in first {
            let object = backend.object(entity);
            assert!((object.translation - translation).length() < EPSILON);
            assert_eq!(object.visible, visible);
        }
    }

    #[test]
    fn test_structure_never_changes_after_creation() {
        let mut scene = SkyScene::default();
        let mut backend = RecordingBackend::default();
        let skies = [
            FixedSky::default().with("Saturn", 40.0, 160.0),
            FixedSky::default().with("Saturn", -5.0, 170.0),
            FixedSky::default().with("Saturn", 12.0, 220.0),
        ];

        for sky in &skies {
            scene
                .synchronize(sky, &mut backend, &paris(), midsummer_evening())
                .unwrap();
            let entry = scene.store.entry_for("Saturn").unwrap();
            assert_eq!(entry.satellites.len(), 4);
            assert!(entry.ring.is_some());
        }
        // Primary, ring and four moons spawned exactly once.
        assert_eq!(backend.objects.len(), 6);
    }

    #[test]
    fn test_at_most_one_light() {
        let mut scene = SkyScene::default();
        let mut backend = RecordingBackend::default();
        for altitude in [-20.0, 5.0, 60.0, 0.0] {
            let sky = FixedSky::default().with("Sun", altitude, 120.0);
            scene
                .synchronize(&sky, &mut backend, &paris(), midsummer_evening())
                .unwrap();
            assert_eq!(backend.lights.len(), 1);
        }
        assert_eq!(backend.despawned.len(), 3);
    }

    #[test]
    fn test_satellites_follow_primary() {
        let mut scene = SkyScene::default();
        let mut backend = RecordingBackend::default();
        for azimuth in [30.0, 75.0, 310.0] {
            let sky = FixedSky::default().with("Jupiter", 20.0, azimuth);
            scene
                .synchronize(&sky, &mut backend, &paris(), midsummer_evening())
                .unwrap();

            let entry = scene.store.entry_for("Jupiter").unwrap();
            let radius = 0.15 * SATELLITE_ORBIT_FACTOR;
            for (i, &satellite) in entry.satellites.iter().enumerate() {
                let angle = std::f32::consts::TAU * i as f32 / 4.0;
                let offset = Vec3::new(radius * angle.cos(), 0.0, radius * angle.sin());
                let actual = backend.object(satellite).translation;
                assert!((actual - (entry.center + offset)).length() < EPSILON);
            }
        }
    }

    #[test]
    fn test_ephemeris_error_leaves_scene_untouched() {
        let mut scene = SkyScene::default();
        let mut backend = RecordingBackend::default();
        let sky = FixedSky::default()
            .with("Sun", 10.0, 100.0)
            .with("Mars", 10.0, 110.0);
        scene
            .synchronize(&sky, &mut backend, &paris(), midsummer_evening())
            .unwrap();
        let light = scene.store.light();
        let mars = scene.store.entry_for("Mars").cloned();

        let broken = FixedSky {
            fail: true,
            ..FixedSky::default()
        };
        let far_future = Utc.with_ymd_and_hms(9999, 1, 1, 0, 0, 0).unwrap();
        let err = scene
            .synchronize(&broken, &mut backend, &paris(), far_future)
            .unwrap_err();

        assert!(matches!(err, EphemerisError::OutOfRange { .. }));
        assert_eq!(scene.store.light(), light);
        assert_eq!(scene.store.entry_for("Mars").cloned(), mars);
        assert!(backend.despawned.is_empty());
        assert_eq!(visible_labels(&backend), vec!["Deimos", "Mars", "Phobos", "Sun"]);
    }

    #[test]
    fn test_textures_loaded_once_per_body() {
        let mut scene = SkyScene::default();
        let mut backend = RecordingBackend::default();
        let sky = FixedSky::default()
            .with("Mars", 10.0, 110.0)
            .with("Jupiter", 10.0, 150.0);
        scene
            .synchronize(&sky, &mut backend, &paris(), midsummer_evening())
            .unwrap();

        let mut loads = backend.texture_loads.clone();
        loads.sort();
        // Satellites share the Moon texture.
        assert_eq!(
            loads,
            vec![
                "textures/2k_jupiter.jpg",
                "textures/2k_mars.jpg",
                "textures/2k_moon.jpg",
            ]
        );
    }

    #[test]
    fn test_real_ephemeris_drives_scene() {
        use crate::ephemeris::LowPrecisionEphemeris;

        let mut scene = SkyScene::default();
        let mut backend = RecordingBackend::default();
        let noon = Utc.with_ymd_and_hms(2024, 6, 21, 12, 0, 0).unwrap();
        let report = scene
            .synchronize(&LowPrecisionEphemeris::default(), &mut backend, &paris(), noon)
            .unwrap();

        assert!(report.created.contains(&"Sun"));
        let sun = report.sun.unwrap();
        assert!(sun.altitude > 60.0);
        assert_eq!(backend.lights.len(), 1);
    }
}
