//! Dashboard data types and resources.

use bevy::prelude::*;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::{
    Arc, Mutex,
    mpsc::{Receiver, Sender},
};

/// Placeholder shown when a value is unknown.
pub const NOT_AVAILABLE: &str = "N/A";

/// Weather summary for one local date, taken from the forecast entry closest
/// to the evening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayWeather {
    pub date: NaiveDate,
    pub temperature: Option<f64>,
    /// Fraction of clear sky, 0.0 to 1.0.
    pub clear_sky: f64,
    /// Local sunset time as `HH:MM`.
    pub sunset: Option<String>,
}

/// One dashboard card, fully formatted.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub sunset: String,
    pub clear_sky: String,
    pub temperature: String,
    pub moon_phase: &'static str,
    pub visible_planets: Vec<&'static str>,
}

#[derive(Debug)]
pub enum WeatherCommand {
    Fetch { latitude: f64, longitude: f64 },
}

#[derive(Debug)]
pub enum WeatherResult {
    Forecast {
        latitude: f64,
        longitude: f64,
        days: Vec<DayWeather>,
        from_cache: bool,
    },
    Error {
        latitude: f64,
        longitude: f64,
        error: String,
    },
}

#[derive(Resource)]
pub struct WeatherChannels {
    pub cmd_tx: Sender<WeatherCommand>,
    pub res_rx: Arc<Mutex<Receiver<WeatherResult>>>,
}

/// Latest weather for the observer location.
#[derive(Resource, Default, Debug)]
pub struct DashboardState {
    pub weather: Vec<DayWeather>,
    pub weather_error: Option<String>,
    pub from_cache: bool,
    /// Location of the outstanding (or last) weather request.
    pub requested_for: Option<(f64, f64)>,
    pub is_loading: bool,
}

impl DashboardState {
    /// Whether a result for this location answers the latest request.
    pub fn is_current(&self, latitude: f64, longitude: f64) -> bool {
        self.requested_for == Some((latitude, longitude))
    }
}

/// Cards currently shown, rebuilt from weather and ephemeris.
#[derive(Resource, Default, Debug)]
pub struct ForecastCards(pub Vec<ForecastDay>);
