//! OpenWeatherMap forecast worker.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Timelike, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::{
    Arc, Mutex,
    mpsc::{self},
};
use std::thread;

use super::cache::{CachedForecast, ForecastCache};
use super::types::{DayWeather, WeatherChannels, WeatherCommand, WeatherResult};

/// Local hour whose forecast stands for the whole evening.
const EVENING_HOUR: i64 = 18;

#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub list: Vec<ForecastItem>,
    #[serde(default)]
    pub city: Option<CityInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastItem {
    pub dt: i64,
    #[serde(default)]
    pub main: Option<MainBlock>,
    #[serde(default)]
    pub clouds: Option<CloudBlock>,
    #[serde(default)]
    pub sys: Option<SysBlock>,
}

#[derive(Debug, Deserialize)]
pub struct MainBlock {
    pub temp: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct CloudBlock {
    pub all: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct SysBlock {
    #[serde(default)]
    pub sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CityInfo {
    #[serde(default)]
    pub sunset: Option<i64>,
}

pub struct WeatherSource {
    pub url: String,
    pub api_key: Option<String>,
    pub cache_hours: i64,
}

pub fn start_weather_worker(source: WeatherSource) -> WeatherChannels {
    let (cmd_tx, cmd_rx) = mpsc::channel::<WeatherCommand>();
    let (res_tx, res_rx) = mpsc::channel::<WeatherResult>();

    thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(err) => {
                eprintln!("[WEATHER] failed to start tokio runtime: {err}");
                return;
            }
        };
        let cache = match ForecastCache::new(source.cache_hours) {
            Ok(cache) => Some(cache),
            Err(err) => {
                eprintln!("[WEATHER] forecast cache disabled: {err}");
                None
            }
        };

        rt.block_on(async move {
            let client = reqwest::Client::new();

            while let Ok(cmd) = cmd_rx.recv() {
                let WeatherCommand::Fetch {
                    latitude,
                    longitude,
                } = cmd;

                let msg = match fetch_forecast(&client, &source, latitude, longitude).await {
                    Ok(days) => {
                        if let Some(cache) = &cache {
                            let entry = CachedForecast {
                                latitude,
                                longitude,
                                days: days.clone(),
                                cached_at: Utc::now(),
                            };
                            if let Err(err) = cache.write(&entry) {
                                eprintln!("[WEATHER] cache write failed: {err}");
                            }
                        }
                        WeatherResult::Forecast {
                            latitude,
                            longitude,
                            days,
                            from_cache: false,
                        }
                    }
                    Err(err) => match cache.as_ref().and_then(|c| c.fresh(latitude, longitude)) {
                        Some(entry) => WeatherResult::Forecast {
                            latitude,
                            longitude,
                            days: entry.days,
                            from_cache: true,
                        },
                        None => WeatherResult::Error {
                            latitude,
                            longitude,
                            error: format!("{err:#}"),
                        },
                    },
                };
                let _ = res_tx.send(msg);
            }
        });
    });

    WeatherChannels {
        cmd_tx,
        res_rx: Arc::new(Mutex::new(res_rx)),
    }
}

async fn fetch_forecast(
    client: &reqwest::Client,
    source: &WeatherSource,
    latitude: f64,
    longitude: f64,
) -> Result<Vec<DayWeather>> {
    let Some(api_key) = source.api_key.as_deref() else {
        anyhow::bail!("no OpenWeatherMap API key configured");
    };
    let url = forecast_url(&source.url, api_key, latitude, longitude)?;
    let body = fetch_body(client, &url).await?;
    let response: ForecastResponse =
        serde_json::from_str(&body).context("invalid forecast json")?;
    Ok(process_weather(&response, &chrono::Local))
}

fn forecast_url(base: &str, api_key: &str, latitude: f64, longitude: f64) -> Result<String> {
    let mut url = reqwest::Url::parse(base).with_context(|| format!("bad weather url {base}"))?;
    url.query_pairs_mut()
        .append_pair("lat", &latitude.to_string())
        .append_pair("lon", &longitude.to_string())
        .append_pair("units", "metric")
        .append_pair("appid", api_key);
    Ok(url.to_string())
}

async fn fetch_body(client: &reqwest::Client, url: &str) -> Result<String> {
    let resp = client.get(url).send().await?;
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        // The url carries the key, keep it out of logs.
        anyhow::bail!("HTTP {} from weather service", status);
    }
    Ok(body)
}

/// Reduce 3-hourly entries to one summary per local date in `tz`.
pub fn process_weather<Tz>(response: &ForecastResponse, tz: &Tz) -> Vec<DayWeather>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut by_date: BTreeMap<NaiveDate, Vec<(DateTime<Tz>, &ForecastItem)>> = BTreeMap::new();
    for item in &response.list {
        let Some(at) = tz.timestamp_opt(item.dt, 0).single() else {
            continue;
        };
        by_date
            .entry(at.date_naive())
            .or_default()
            .push((at, item));
    }

    let city_sunset = response.city.as_ref().and_then(|city| city.sunset);

    by_date
        .into_iter()
        .filter_map(|(date, entries)| {
            let mut chosen = entries.first()?;
            for entry in &entries[1..] {
                if evening_distance(&entry.0) < evening_distance(&chosen.0) {
                    chosen = entry;
                }
            }
            let item = chosen.1;

            let clouds = item
                .clouds
                .as_ref()
                .and_then(|c| c.all)
                .unwrap_or(100.0)
                .clamp(0.0, 100.0);
            let sunset = item
                .sys
                .as_ref()
                .and_then(|sys| sys.sunset)
                .or(city_sunset)
                .and_then(|ts| tz.timestamp_opt(ts, 0).single())
                .map(|t| t.format("%H:%M").to_string());

            Some(DayWeather {
                date,
                temperature: item.main.as_ref().and_then(|m| m.temp),
                clear_sky: 1.0 - clouds / 100.0,
                sunset,
            })
        })
        .collect()
}

fn evening_distance<Tz: TimeZone>(at: &DateTime<Tz>) -> i64 {
    (at.hour() as i64 - EVENING_HOUR).abs()
}
