//! Low-precision geocentric Moon position (truncated Meeus lunar theory).

use crate::core::coordinates::normalize_deg;

/// Geocentric ecliptic coordinates of the Moon, referred to the equinox of date.
#[derive(Copy, Clone, Debug)]
pub struct LunarPosition {
    /// Ecliptic longitude (deg)
    pub longitude: f64,
    /// Ecliptic latitude (deg)
    pub latitude: f64,
    /// Earth-Moon distance (km)
    pub distance_km: f64,
}

// Dominant periodic terms (Meeus, Astronomical Algorithms, ch. 47).
// Columns: D, M, M', F multipliers, then longitude in 1e-6 deg and distance in 1e-3 km.
const LON_DIST_TERMS: [(i8, i8, i8, i8, i32, i32); 20] = [
    (0, 0, 1, 0, 6288774, -20905355),
    (2, 0, -1, 0, 1274027, -3699111),
    (2, 0, 0, 0, 658314, -2955968),
    (0, 0, 2, 0, 213618, -569925),
    (0, 1, 0, 0, -185116, 48888),
    (0, 0, 0, 2, -114332, -3149),
    (2, 0, -2, 0, 58793, 246158),
    (2, -1, -1, 0, 57066, -152138),
    (2, 0, 1, 0, 53322, -170733),
    (2, -1, 0, 0, 45758, -204586),
    (0, 1, -1, 0, -40923, -129620),
    (1, 0, 0, 0, -34720, 108743),
    (0, 1, 1, 0, -30383, 104755),
    (2, 0, 0, -2, 15327, 10321),
    (0, 0, 1, 2, -12528, 0),
    (0, 0, 1, -2, 10980, 79661),
    (4, 0, -1, 0, 10675, -34782),
    (0, 0, 3, 0, 10034, -23210),
    (4, 0, -2, 0, 8548, -21636),
    (2, 1, -1, 0, -7888, 24208),
];

// Columns: D, M, M', F multipliers, then latitude in 1e-6 deg.
const LAT_TERMS: [(i8, i8, i8, i8, i32); 20] = [
    (0, 0, 0, 1, 5128122),
    (0, 0, 1, 1, 280602),
    (0, 0, 1, -1, 277693),
    (2, 0, 0, -1, 173237),
    (2, 0, -1, 1, 55413),
    (2, 0, -1, -1, 46271),
    (2, 0, 0, 1, 32573),
    (0, 0, 2, 1, 17198),
    (2, 0, 1, -1, 9266),
    (0, 0, 2, -1, 8822),
    (2, -1, 0, -1, 8216),
    (2, 0, -2, -1, 4324),
    (2, 0, 1, 1, 4200),
    (2, 1, 0, -1, -3359),
    (2, -1, -1, 1, 2463),
    (2, -1, 0, 1, 2211),
    (2, -1, -1, -1, 2065),
    (0, 1, -1, -1, -1870),
    (4, 0, -1, -1, 1828),
    (0, 1, 0, 1, -1794),
];

/// Moon position at `t` Julian centuries from J2000.0.
pub fn lunar_position(t: f64) -> LunarPosition {
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;

    let l_prime = normalize_deg(
        218.3164477 + 481267.88123421 * t - 0.0015786 * t2 + t3 / 538841.0 - t4 / 65194000.0,
    );
    let d = normalize_deg(
        297.8501921 + 445267.1114034 * t - 0.0018819 * t2 + t3 / 545868.0 - t4 / 113065000.0,
    );
    let m = normalize_deg(357.5291092 + 35999.0502909 * t - 0.0001536 * t2 + t3 / 24490000.0);
    let mp = normalize_deg(
        134.9633964 + 477198.8675055 * t + 0.0087414 * t2 + t3 / 69699.0 - t4 / 14712000.0,
    );
    let f = normalize_deg(
        93.2720950 + 483202.0175233 * t - 0.0036539 * t2 - t3 / 3526000.0 + t4 / 863310000.0,
    );

    // Eccentricity of Earth's orbit scales terms involving the Sun's anomaly.
    let e = 1.0 - 0.002516 * t - 0.0000074 * t2;
    let e_factor = |mult: i8| match mult.abs() {
        1 => e,
        2 => e * e,
        _ => 1.0,
    };
    let argument = |dm: i8, mm: i8, mpm: i8, fm: i8| {
        (dm as f64 * d + mm as f64 * m + mpm as f64 * mp + fm as f64 * f).to_radians()
    };

    let mut sum_l = 0.0;
    let mut sum_r = 0.0;
    for (dm, mm, mpm, fm, l, r) in LON_DIST_TERMS {
        let arg = argument(dm, mm, mpm, fm);
        sum_l += l as f64 * e_factor(mm) * arg.sin();
        sum_r += r as f64 * e_factor(mm) * arg.cos();
    }

    let mut sum_b = 0.0;
    for (dm, mm, mpm, fm, b) in LAT_TERMS {
        sum_b += b as f64 * e_factor(mm) * argument(dm, mm, mpm, fm).sin();
    }

    let l_prime_rad = l_prime.to_radians();
    let f_rad = f.to_radians();
    let mp_rad = mp.to_radians();
    let a1 = (119.75 + 131.849 * t).to_radians();
    let a2 = (53.09 + 479264.290 * t).to_radians();
    let a3 = (313.45 + 481266.484 * t).to_radians();

    // Venus, Jupiter and flattening corrections
    sum_l += 3958.0 * a1.sin() + 1962.0 * (l_prime_rad - f_rad).sin() + 318.0 * a2.sin();
    sum_b += -2235.0 * l_prime_rad.sin()
        + 382.0 * a3.sin()
        + 175.0 * (a1 - f_rad).sin()
        + 175.0 * (a1 + f_rad).sin()
        + 127.0 * (l_prime_rad - mp_rad).sin()
        - 115.0 * (l_prime_rad + mp_rad).sin();

    LunarPosition {
        longitude: normalize_deg(l_prime + sum_l / 1_000_000.0),
        latitude: sum_b / 1_000_000.0,
        distance_km: 385000.56 + sum_r / 1000.0,
    }
}

/// Mean obliquity of the ecliptic of date (deg), first-order.
pub fn obliquity_of_date_deg(t: f64) -> f64 {
    23.439291 - 0.0130042 * t
}
