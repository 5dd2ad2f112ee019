//! Turns weather summaries and ephemeris lookups into dashboard cards.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};

use super::types::{DayWeather, ForecastDay, NOT_AVAILABLE};
use crate::config::AppSettings;
use crate::ephemeris::{Body, CoordinateSource, EphemerisError, LowPrecisionEphemeris, Observer};
use crate::observer::local_to_utc;

/// Planets worth listing on a card, in solar order.
pub const CARD_PLANETS: [Body; 5] = [
    Body::Mercury,
    Body::Venus,
    Body::Mars,
    Body::Jupiter,
    Body::Saturn,
];

/// Upper bound on cards, whatever the settings ask for.
pub const MAX_FORECAST_DAYS: u32 = 16;

/// Glyph for a moon phase angle in degrees (0 new, 180 full).
pub fn moon_phase_glyph(phase: f64) -> &'static str {
    match phase {
        p if (0.0..45.0).contains(&p) => "🌒",
        p if (45.0..90.0).contains(&p) => "🌓",
        p if (90.0..135.0).contains(&p) => "🌔",
        p if (135.0..225.0).contains(&p) => "🌕",
        p if (225.0..270.0).contains(&p) => "🌖",
        p if (270.0..315.0).contains(&p) => "🌗",
        p if (315.0..360.0).contains(&p) => "🌘",
        _ => "🌑",
    }
}

pub fn format_clear_sky(clear_sky: f64) -> String {
    format!("{}%", (clear_sky * 100.0).round() as i64)
}

pub fn format_temperature(celsius: f64) -> String {
    format!("{:.1}°C", celsius)
}

/// Planets above `min_altitude` degrees at `at`.
pub fn visible_planets(
    source: &impl CoordinateSource,
    at: DateTime<Utc>,
    observer: &Observer,
    min_altitude: f64,
) -> Result<Vec<&'static str>, EphemerisError> {
    let mut visible = Vec::new();
    for body in CARD_PLANETS {
        if source.horizon_of(body.name(), at, observer)?.altitude > min_altitude {
            visible.push(body.name());
        }
    }
    Ok(visible)
}

/// One card per day starting at `today`, at most [`MAX_FORECAST_DAYS`].
/// Days without weather get placeholders.
pub fn build_forecast(
    ephemeris: &LowPrecisionEphemeris,
    today: NaiveDate,
    observer: &Observer,
    weather: &[DayWeather],
    settings: &AppSettings,
) -> Result<Vec<ForecastDay>, EphemerisError> {
    let day_count = settings.forecast_days.min(MAX_FORECAST_DAYS);
    let mut days = Vec::with_capacity(day_count as usize);

    for offset in 0..day_count {
        let Some(date) = today.checked_add_signed(TimeDelta::days(offset as i64)) else {
            break;
        };
        let day_weather = weather.iter().find(|w| w.date == date);
        // Planets and moon are evaluated at the start of the local day.
        let midnight = local_to_utc(date.and_time(NaiveTime::MIN));

        days.push(ForecastDay {
            date,
            sunset: day_weather
                .and_then(|w| w.sunset.clone())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            clear_sky: day_weather
                .map(|w| format_clear_sky(w.clear_sky))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            temperature: day_weather
                .and_then(|w| w.temperature)
                .map(format_temperature)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            moon_phase: moon_phase_glyph(ephemeris.moon_phase(midnight)?),
            visible_planets: visible_planets(
                ephemeris,
                midnight,
                observer,
                settings.planet_min_altitude,
            )?,
        });
    }

    Ok(days)
}
