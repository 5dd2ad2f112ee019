//! Forecast disk cache
//!
//! Keeps the last forecast per location so the dashboard still has weather
//! when the network is down.

use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use super::types::DayWeather;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedForecast {
    pub latitude: f64,
    pub longitude: f64,
    pub days: Vec<DayWeather>,
    pub cached_at: DateTime<Utc>,
}

pub struct ForecastCache {
    cache_dir: PathBuf,
    expiration_hours: i64,
}

impl ForecastCache {
    /// Cache in the platform cache directory:
    /// - macOS: ~/Library/Caches/bevysky/forecast/
    /// - Linux: ~/.cache/bevysky/forecast/
    /// - Windows: %LOCALAPPDATA%\bevysky\cache\forecast\
    pub fn new(expiration_hours: i64) -> Result<Self, anyhow::Error> {
        let proj_dirs = ProjectDirs::from("", "", "bevysky")
            .ok_or_else(|| anyhow::anyhow!("Failed to resolve cache directory"))?;

        Self::new_in_dir(proj_dirs.cache_dir().join("forecast"), expiration_hours)
    }

    pub fn new_in_dir(cache_dir: PathBuf, expiration_hours: i64) -> Result<Self, anyhow::Error> {
        fs::create_dir_all(&cache_dir)?;

        Ok(Self {
            cache_dir,
            expiration_hours,
        })
    }

    /// Ok(None) on a cache miss, Err if the file exists but is unreadable.
    pub fn read(&self, latitude: f64, longitude: f64) -> Result<Option<CachedForecast>, anyhow::Error> {
        let path = self.cache_path(latitude, longitude);
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    pub fn write(&self, entry: &CachedForecast) -> Result<(), anyhow::Error> {
        let path = self.cache_path(entry.latitude, entry.longitude);
        fs::write(&path, serde_json::to_string_pretty(entry)?)?;
        Ok(())
    }

    /// An expiry too large for a `Duration` never expires.
    pub fn is_valid(&self, entry: &CachedForecast) -> bool {
        let age = Utc::now().signed_duration_since(entry.cached_at);
        match Duration::try_hours(self.expiration_hours) {
            Some(max_age) => age < max_age,
            None => true,
        }
    }

    /// A fresh entry for this location, if any. Read errors count as a miss.
    pub fn fresh(&self, latitude: f64, longitude: f64) -> Option<CachedForecast> {
        self.read(latitude, longitude)
            .ok()
            .flatten()
            .filter(|entry| self.is_valid(entry))
    }

    // Two decimals is roughly a 1 km grid, finer than the forecast itself.
    fn cache_path(&self, latitude: f64, longitude: f64) -> PathBuf {
        self.cache_dir
            .join(format!("{:.2}_{:.2}.json", latitude, longitude))
    }
}
