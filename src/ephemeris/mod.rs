//! Ephemeris: where the Sun, Moon and planets sit in the observer's sky.
//!
//! The sky scene and the dashboard only talk to [`CoordinateSource`]; the
//! bundled [`LowPrecisionEphemeris`] is an analytic, arc-minute-level model
//! that is more than enough for an artistic sky dome.

use bevy::math::DVec3;
use bevy::prelude::*;
use chrono::{DateTime, Datelike, Utc};
use std::ops::RangeInclusive;
use std::str::FromStr;
use thiserror::Error;

use crate::core::coordinates::{
    AU_KM, OBLIQUITY_J2000_DEG, ecliptic_to_equatorial, julian_centuries, local_sidereal_rad,
    normalize_deg, observer_position_km,
};

pub mod moon;
pub mod planets;

use moon::{lunar_position, obliquity_of_date_deg};
use planets::{Planet, heliocentric_ecliptic_au};

/// Geographic observer on a spherical Earth.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Observer {
    /// Degrees, north positive
    pub latitude: f64,
    /// Degrees, east positive
    pub longitude: f64,
    /// Meters above sea level
    pub elevation_m: f64,
}

impl Observer {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation_m: 0.0,
        }
    }
}

/// Topocentric equatorial coordinates (J2000 mean equator).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Equatorial {
    /// Right ascension in sidereal hours [0, 24)
    pub right_ascension: f64,
    /// Declination in degrees
    pub declination: f64,
    pub distance_km: f64,
}

/// Horizon coordinates in degrees. Azimuth is measured from north through east.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Horizontal {
    pub altitude: f64,
    pub azimuth: f64,
}

/// Atmospheric refraction model applied to altitudes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Refraction {
    None,
    #[default]
    Normal,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EphemerisError {
    #[error("{at} is outside the supported range (years {min} to {max})")]
    OutOfRange {
        at: DateTime<Utc>,
        min: i32,
        max: i32,
    },
    #[error("invalid observer location (lat {latitude}, lon {longitude})")]
    InvalidObserver { latitude: f64, longitude: f64 },
    #[error("unknown body: {0}")]
    UnknownBody(String),
}

/// Bodies the bundled ephemeris can locate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Body {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
}

impl Body {
    pub const ALL: [Body; 7] = [
        Body::Sun,
        Body::Moon,
        Body::Mercury,
        Body::Venus,
        Body::Mars,
        Body::Jupiter,
        Body::Saturn,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Body::Sun => "Sun",
            Body::Moon => "Moon",
            Body::Mercury => "Mercury",
            Body::Venus => "Venus",
            Body::Mars => "Mars",
            Body::Jupiter => "Jupiter",
            Body::Saturn => "Saturn",
        }
    }

    fn planet(&self) -> Option<Planet> {
        match self {
            Body::Mercury => Some(Planet::Mercury),
            Body::Venus => Some(Planet::Venus),
            Body::Mars => Some(Planet::Mars),
            Body::Jupiter => Some(Planet::Jupiter),
            Body::Saturn => Some(Planet::Saturn),
            Body::Sun | Body::Moon => None,
        }
    }
}

impl FromStr for Body {
    type Err = EphemerisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Body::ALL
            .into_iter()
            .find(|body| body.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| EphemerisError::UnknownBody(s.to_string()))
    }
}

/// Source of body coordinates for a given instant and observer.
pub trait CoordinateSource {
    fn equatorial(
        &self,
        body: &str,
        at: DateTime<Utc>,
        observer: &Observer,
    ) -> Result<Equatorial, EphemerisError>;

    fn horizon(
        &self,
        at: DateTime<Utc>,
        observer: &Observer,
        equatorial: &Equatorial,
    ) -> Result<Horizontal, EphemerisError>;

    fn horizon_of(
        &self,
        body: &str,
        at: DateTime<Utc>,
        observer: &Observer,
    ) -> Result<Horizontal, EphemerisError> {
        let equ = self.equatorial(body, at, observer)?;
        self.horizon(at, observer, &equ)
    }
}

/// Analytic ephemeris: Keplerian planets, truncated lunar series.
#[derive(Resource, Clone, Debug)]
pub struct LowPrecisionEphemeris {
    pub refraction: Refraction,
    pub supported_years: RangeInclusive<i32>,
}

impl Default for LowPrecisionEphemeris {
    fn default() -> Self {
        Self {
            refraction: Refraction::Normal,
            supported_years: 1000..=3000,
        }
    }
}

impl LowPrecisionEphemeris {
    fn check_time(&self, at: DateTime<Utc>) -> Result<(), EphemerisError> {
        if self.supported_years.contains(&at.year()) {
            Ok(())
        } else {
            Err(EphemerisError::OutOfRange {
                at,
                min: *self.supported_years.start(),
                max: *self.supported_years.end(),
            })
        }
    }

    fn check_observer(&self, observer: &Observer) -> Result<(), EphemerisError> {
        let valid = observer.latitude.is_finite()
            && observer.longitude.is_finite()
            && observer.elevation_m.is_finite()
            && (-90.0..=90.0).contains(&observer.latitude);
        if valid {
            Ok(())
        } else {
            Err(EphemerisError::InvalidObserver {
                latitude: observer.latitude,
                longitude: observer.longitude,
            })
        }
    }

    /// Geocentric equatorial position in km at `t` Julian centuries.
    fn geocentric_km(&self, body: Body, t: f64) -> DVec3 {
        let eps_j2000 = OBLIQUITY_J2000_DEG.to_radians();
        let earth = heliocentric_ecliptic_au(Planet::Earth, t);
        match body {
            Body::Sun => ecliptic_to_equatorial(-earth, eps_j2000) * AU_KM,
            Body::Moon => {
                let pos = lunar_position(t);
                let (lon, lat) = (pos.longitude.to_radians(), pos.latitude.to_radians());
                let ecl = DVec3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin())
                    * pos.distance_km;
                ecliptic_to_equatorial(ecl, obliquity_of_date_deg(t).to_radians())
            }
            planet => {
                // Every non-Sun, non-Moon body maps to a planet.
                let helio = planet
                    .planet()
                    .map(|p| heliocentric_ecliptic_au(p, t))
                    .unwrap_or(earth);
                ecliptic_to_equatorial(helio - earth, eps_j2000) * AU_KM
            }
        }
    }

    /// Moon phase angle in degrees: 0 new, 90 first quarter, 180 full, 270 last quarter.
    pub fn moon_phase(&self, at: DateTime<Utc>) -> Result<f64, EphemerisError> {
        self.check_time(at)?;
        let t = julian_centuries(at);
        let earth = heliocentric_ecliptic_au(Planet::Earth, t);
        let sun_longitude = (-earth.y).atan2(-earth.x).to_degrees();
        Ok(normalize_deg(lunar_position(t).longitude - sun_longitude))
    }
}

impl CoordinateSource for LowPrecisionEphemeris {
    fn equatorial(
        &self,
        body: &str,
        at: DateTime<Utc>,
        observer: &Observer,
    ) -> Result<Equatorial, EphemerisError> {
        self.check_time(at)?;
        self.check_observer(observer)?;
        let body: Body = body.parse()?;

        let t = julian_centuries(at);
        let lst = local_sidereal_rad(at, observer.longitude);
        let topo = self.geocentric_km(body, t)
            - observer_position_km(observer.latitude, observer.elevation_m, lst);

        let distance_km = topo.length();
        let right_ascension = normalize_deg(topo.y.atan2(topo.x).to_degrees()) / 15.0;
        let declination = (topo.z / distance_km).clamp(-1.0, 1.0).asin().to_degrees();

        Ok(Equatorial {
            right_ascension,
            declination,
            distance_km,
        })
    }

    fn horizon(
        &self,
        at: DateTime<Utc>,
        observer: &Observer,
        equatorial: &Equatorial,
    ) -> Result<Horizontal, EphemerisError> {
        self.check_time(at)?;
        self.check_observer(observer)?;

        let lst = local_sidereal_rad(at, observer.longitude);
        let mut horizontal = equatorial_to_horizontal(
            equatorial.right_ascension,
            equatorial.declination,
            observer.latitude,
            lst,
        );
        if self.refraction == Refraction::Normal {
            horizontal.altitude += refraction_angle(horizontal.altitude);
        }
        Ok(horizontal)
    }
}

/// Convert equatorial coordinates to horizon coordinates (no refraction).
pub fn equatorial_to_horizontal(
    right_ascension_hours: f64,
    declination_deg: f64,
    latitude_deg: f64,
    local_sidereal: f64,
) -> Horizontal {
    let hour_angle = local_sidereal - (right_ascension_hours * 15.0).to_radians();
    let (sin_h, cos_h) = hour_angle.sin_cos();
    let (sin_dec, cos_dec) = declination_deg.to_radians().sin_cos();
    let (sin_lat, cos_lat) = latitude_deg.to_radians().sin_cos();

    let altitude = (sin_lat * sin_dec + cos_lat * cos_dec * cos_h)
        .clamp(-1.0, 1.0)
        .asin();
    let azimuth = (-cos_dec * sin_h).atan2(sin_dec * cos_lat - cos_dec * cos_h * sin_lat);

    Horizontal {
        altitude: altitude.to_degrees(),
        azimuth: normalize_deg(azimuth.to_degrees()),
    }
}

/// Refraction (degrees) to add to a geometric altitude, Saemundsson-style with
/// a smooth fade below the horizon.
pub fn refraction_angle(altitude_deg: f64) -> f64 {
    if !(-90.0..=90.0).contains(&altitude_deg) {
        return 0.0;
    }
    let hd = altitude_deg.max(-1.0);
    let mut refr = (1.02 / (hd + 10.3 / (hd + 5.11)).to_radians().tan()) / 60.0;
    if altitude_deg < -1.0 {
        refr *= (altitude_deg + 90.0) / 89.0;
    }
    refr
}
