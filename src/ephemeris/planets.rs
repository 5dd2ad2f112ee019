//! Heliocentric planet positions from approximate Keplerian elements.
//!
//! Elements and rates come from E.M. Standish, "Keplerian Elements for
//! Approximate Positions of the Major Planets" (JPL, table 1, 1800-2050 AD).
//! Outside that window the error grows slowly; the scene only needs the
//! direction to within a fraction of a degree.

use bevy::math::DVec3;
use std::f64::consts::TAU;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Planet {
    Mercury,
    Venus,
    /// Earth-Moon barycenter.
    Earth,
    Mars,
    Jupiter,
    Saturn,
}

/// Element value at J2000 and its rate per Julian century.
#[derive(Copy, Clone)]
struct Element(f64, f64);

impl Element {
    fn at(self, t: f64) -> f64 {
        self.0 + self.1 * t
    }
}

#[derive(Copy, Clone)]
struct KeplerianElements {
    /// Semi-major axis (au)
    a: Element,
    /// Eccentricity
    e: Element,
    /// Inclination (deg)
    i: Element,
    /// Mean longitude (deg)
    l: Element,
    /// Longitude of perihelion (deg)
    long_peri: Element,
    /// Longitude of the ascending node (deg)
    node: Element,
}

impl Planet {
    fn elements(self) -> KeplerianElements {
        match self {
            Planet::Mercury => KeplerianElements {
                a: Element(0.38709927, 0.00000037),
                e: Element(0.20563593, 0.00001906),
                i: Element(7.00497902, -0.00594749),
                l: Element(252.25032350, 149472.67411175),
                long_peri: Element(77.45779628, 0.16047689),
                node: Element(48.33076593, -0.12534081),
            },
            Planet::Venus => KeplerianElements {
                a: Element(0.72333566, 0.00000390),
                e: Element(0.00677672, -0.00004107),
                i: Element(3.39467605, -0.00078890),
                l: Element(181.97909950, 58517.81538729),
                long_peri: Element(131.60246718, 0.00268329),
                node: Element(76.67984255, -0.27769418),
            },
            Planet::Earth => KeplerianElements {
                a: Element(1.00000261, 0.00000562),
                e: Element(0.01671123, -0.00004392),
                i: Element(-0.00001531, -0.01294668),
                l: Element(100.46457166, 35999.37244981),
                long_peri: Element(102.93768193, 0.32327364),
                node: Element(0.0, 0.0),
            },
            Planet::Mars => KeplerianElements {
                a: Element(1.52371034, 0.00001847),
                e: Element(0.09339410, 0.00007882),
                i: Element(1.84969142, -0.00813131),
                l: Element(-4.55343205, 19140.30268499),
                long_peri: Element(-23.94362959, 0.44441088),
                node: Element(49.55953891, -0.29257343),
            },
            Planet::Jupiter => KeplerianElements {
                a: Element(5.20288700, -0.00011607),
                e: Element(0.04838624, -0.00013253),
                i: Element(1.30439695, -0.00183714),
                l: Element(34.39644051, 3034.74612775),
                long_peri: Element(14.72847983, 0.21252668),
                node: Element(100.47390909, 0.20469106),
            },
            Planet::Saturn => KeplerianElements {
                a: Element(9.53667594, -0.00125060),
                e: Element(0.05386179, -0.00050991),
                i: Element(2.48599187, 0.00193609),
                l: Element(49.95424423, 1222.49362201),
                long_peri: Element(92.59887831, -0.41897216),
                node: Element(113.66242448, -0.28867794),
            },
        }
    }
}

/// Solve Kepler's equation `M = E - e sin E` for the eccentric anomaly (radians).
pub fn eccentric_anomaly(mean_anomaly: f64, e: f64) -> f64 {
    let m = mean_anomaly.rem_euclid(TAU);
    let mut ea = if e < 0.8 { m } else { std::f64::consts::PI };

    for _ in 0..50 {
        let delta = (ea - e * ea.sin() - m) / (1.0 - e * ea.cos());
        ea -= delta;
        if delta.abs() < 1e-12 {
            break;
        }
    }
    ea
}

/// Heliocentric position in the J2000 ecliptic frame (au) at `t` Julian
/// centuries from J2000.0.
pub fn heliocentric_ecliptic_au(planet: Planet, t: f64) -> DVec3 {
    let el = planet.elements();
    let a = el.a.at(t);
    let e = el.e.at(t);
    let incl = el.i.at(t).to_radians();
    let l = el.l.at(t);
    let long_peri = el.long_peri.at(t);
    let node = el.node.at(t);

    let arg_peri = (long_peri - node).to_radians();
    let mean_anomaly = (l - long_peri).to_radians();
    let ea = eccentric_anomaly(mean_anomaly, e);

    // Orbital plane, x toward perihelion
    let xp = a * (ea.cos() - e);
    let yp = a * (1.0 - e * e).sqrt() * ea.sin();

    let (sw, cw) = arg_peri.sin_cos();
    let (so, co) = node.to_radians().sin_cos();
    let (si, ci) = incl.sin_cos();

    DVec3::new(
        (cw * co - sw * so * ci) * xp + (-sw * co - cw * so * ci) * yp,
        (cw * so + sw * co * ci) * xp + (-sw * so + cw * co * ci) * yp,
        (sw * si) * xp + (cw * si) * yp,
    )
}
