//! Application settings
//!
//! Read once at startup from `settings.json` in the platform config directory:
//! - macOS: ~/Library/Application Support/bevysky/
//! - Linux: ~/.config/bevysky/
//! - Windows: %APPDATA%\bevysky\config\
//!
//! A missing file means defaults. A broken file is reported and ignored.

use bevy::prelude::*;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Observer used at startup and after a failed geolocation lookup.
    pub default_latitude: f64,
    pub default_longitude: f64,
    pub weather_url: String,
    pub weather_api_key: Option<String>,
    pub geolocation_url: String,
    pub forecast_days: u32,
    /// Minimum altitude (deg) for a planet to be listed on a forecast card.
    pub planet_min_altitude: f64,
    pub forecast_cache_hours: i64,
    pub sun_illuminance: f32,
    pub ambient_brightness: f32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_latitude: 48.85,
            default_longitude: 2.29,
            weather_url: "https://api.openweathermap.org/data/2.5/forecast".to_string(),
            weather_api_key: None,
            geolocation_url: "http://ip-api.com/json".to_string(),
            forecast_days: 10,
            planet_min_altitude: 10.0,
            forecast_cache_hours: 3,
            sun_illuminance: 8_000.0,
            ambient_brightness: 80.0,
        }
    }
}

impl AppSettings {
    /// Settings from the platform config dir, then the API key environment override.
    pub fn load() -> Self {
        let mut settings = settings_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default();
        if let Ok(key) = std::env::var(API_KEY_ENV)
            && !key.trim().is_empty()
        {
            settings.weather_api_key = Some(key.trim().to_string());
        }
        settings
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|text| serde_json::from_str(&text).map_err(anyhow::Error::from))
        {
            Ok(settings) => {
                info!("Loaded settings from {}", path.display());
                settings
            }
            Err(err) => {
                warn!("Ignoring settings file {}: {}", path.display(), err);
                Self::default()
            }
        }
    }
}

fn settings_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "bevysky").map(|dirs| dirs.config_dir().join("settings.json"))
}
