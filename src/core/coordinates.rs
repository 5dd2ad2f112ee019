//! Core coordinate utilities
//!
//! Time scales, sidereal time and the frame conversions shared by the ephemeris
//! and the sky scene:
//! - Julian dates and Greenwich/local sidereal time
//! - Ecliptic -> equatorial rotation
//! - Horizon (altitude/azimuth) -> Bevy world placement

use bevy::math::{DVec3, Vec3};
use chrono::{DateTime, Datelike, Timelike, Utc};

/// Equatorial Earth radius used for topocentric corrections.
pub const EARTH_RADIUS_KM: f64 = 6378.137;

/// Kilometers per astronomical unit.
pub const AU_KM: f64 = 149_597_870.7;

/// Julian date of the J2000.0 epoch.
pub const J2000_JD: f64 = 2451545.0;

/// Mean obliquity of the ecliptic at J2000.0 (degrees).
pub const OBLIQUITY_J2000_DEG: f64 = 23.43928;

// ========================= Time scales =========================

/// Compute the Julian Date (UTC) for a given timestamp.
/// Uses the standard Gregorian calendar to JD conversion.
pub fn julian_date_utc(t: DateTime<Utc>) -> f64 {
    let mut y = t.year();
    let mut m = t.month() as i32;
    let d = t.day() as i32;

    let hour = t.hour() as f64;
    let minute = t.minute() as f64;
    let sec = t.second() as f64 + (t.nanosecond() as f64) * 1e-9_f64;
    let day_fraction = (hour + (minute + sec / 60.0) / 60.0) / 24.0;

    if m <= 2 {
        y -= 1;
        m += 12;
    }

    let a = (y as f64 / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();

    let jd0 = (365.25 * (y as f64 + 4716.0)).floor()
        + (30.6001 * ((m + 1) as f64)).floor()
        + d as f64
        + b
        - 1524.5;

    jd0 + day_fraction
}

/// Julian centuries elapsed since J2000.0.
pub fn julian_centuries(t: DateTime<Utc>) -> f64 {
    (julian_date_utc(t) - J2000_JD) / 36525.0
}

/// Greenwich Mean Sidereal Time (radians) using the IAU 1982 polynomial.
/// Assumes UT1 ~= UTC, which is plenty for placing bodies on a sky dome.
pub fn gmst_rad(t: DateTime<Utc>) -> f64 {
    let t_cent = julian_centuries(t);

    let gmst_sec =
        67310.54841 + (876600.0 * 3600.0 + 8640184.812866) * t_cent + 0.093104 * t_cent * t_cent
            - 6.2e-6 * t_cent * t_cent * t_cent;

    let sec_in_day = 86400.0_f64;
    gmst_sec.rem_euclid(sec_in_day) * (std::f64::consts::TAU / sec_in_day)
}

/// Local mean sidereal time (radians) at an east-positive longitude in degrees.
pub fn local_sidereal_rad(t: DateTime<Utc>, longitude_deg: f64) -> f64 {
    (gmst_rad(t) + longitude_deg.to_radians()).rem_euclid(std::f64::consts::TAU)
}

// ========================= Angles and frames =========================

pub fn normalize_deg(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// Rotate an ecliptic vector into the equatorial frame for the given obliquity.
pub fn ecliptic_to_equatorial(v: DVec3, obliquity_rad: f64) -> DVec3 {
    let (s, c) = obliquity_rad.sin_cos();
    DVec3::new(v.x, v.y * c - v.z * s, v.y * s + v.z * c)
}

/// Geocentric equatorial position of an observer on a spherical Earth (km).
pub fn observer_position_km(latitude_deg: f64, elevation_m: f64, local_sidereal: f64) -> DVec3 {
    let r = EARTH_RADIUS_KM + elevation_m / 1000.0;
    let lat = latitude_deg.to_radians();
    DVec3::new(
        r * lat.cos() * local_sidereal.cos(),
        r * lat.cos() * local_sidereal.sin(),
        r * lat.sin(),
    )
}

/// Place a horizon direction in the Bevy world at `radius` from the origin.
///
/// Y is up. Azimuth is negated before the conversion so that east ends up on
/// screen-left when looking north, matching the sky as seen from the ground.
pub fn horizon_to_cartesian(altitude_deg: f64, azimuth_deg: f64, radius: f32) -> Vec3 {
    let alt = altitude_deg.to_radians();
    let az = -azimuth_deg.to_radians();
    let radius = radius as f64;

    let y = radius * alt.sin();
    let r = radius * alt.cos();
    let x = r * az.sin();
    let z = r * az.cos();
    Vec3::new(x as f32, y as f32, z as f32)
}

// =================================== Tests ===================================
