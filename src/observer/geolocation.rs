//! IP-based geolocation worker.
//!
//! Runs on its own thread with a private tokio runtime. Either outcome moves
//! the observer (a failure resets it to the default location), so each lookup
//! triggers exactly one scene sync. If two answers arrive, the last one wins.

use anyhow::{Context, Result};
use bevy::prelude::*;
use serde::Deserialize;
use std::sync::{
    Arc, Mutex,
    mpsc::{self, Receiver, Sender},
};
use std::thread;

use super::ObserverState;
use crate::config::AppSettings;

#[derive(Debug)]
pub enum GeolocationCommand {
    Locate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeolocationResult {
    Located { latitude: f64, longitude: f64 },
    Failed { error: String },
}

#[derive(Resource)]
pub struct GeolocationChannels {
    pub cmd_tx: Sender<GeolocationCommand>,
    pub res_rx: Arc<Mutex<Receiver<GeolocationResult>>>,
}

/// Subset of the ip-api.com response.
#[derive(Debug, Deserialize)]
struct IpLocation {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

pub fn start_geolocation_worker(url: String) -> GeolocationChannels {
    let (cmd_tx, cmd_rx) = mpsc::channel::<GeolocationCommand>();
    let (res_tx, res_rx) = mpsc::channel::<GeolocationResult>();

    thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(err) => {
                eprintln!("[GEO] failed to start tokio runtime: {err}");
                return;
            }
        };
        rt.block_on(async move {
            let client = reqwest::Client::new();

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    GeolocationCommand::Locate => {
                        let msg = match locate(&client, &url).await {
                            Ok((latitude, longitude)) => GeolocationResult::Located {
                                latitude,
                                longitude,
                            },
                            Err(err) => GeolocationResult::Failed {
                                error: format!("{err:#}"),
                            },
                        };
                        let _ = res_tx.send(msg);
                    }
                }
            }
        });
    });

    GeolocationChannels {
        cmd_tx,
        res_rx: Arc::new(Mutex::new(res_rx)),
    }
}

async fn locate(client: &reqwest::Client, url: &str) -> Result<(f64, f64)> {
    let resp = client
        .get(url)
        .header("accept", "application/json")
        .send()
        .await
        .context("request failed")?;
    let status = resp.status();
    let body = resp.text().await.context("read response")?;
    if !status.is_success() {
        anyhow::bail!("http {} for {}", status, url);
    }
    parse_location(&body)
}

/// Extract (latitude, longitude) from an ip-api.com style JSON body.
pub fn parse_location(body: &str) -> Result<(f64, f64)> {
    let location: IpLocation = serde_json::from_str(body).context("invalid json")?;
    if location.status != "success" {
        anyhow::bail!(
            "lookup {}: {}",
            location.status,
            location.message.as_deref().unwrap_or("no reason given")
        );
    }
    let (Some(lat), Some(lon)) = (location.lat, location.lon) else {
        anyhow::bail!("response missing lat/lon");
    };
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        anyhow::bail!("coordinates out of range: {lat}, {lon}");
    }
    Ok((lat, lon))
}

pub fn setup_geolocation_worker(mut commands: Commands, settings: Option<Res<AppSettings>>) {
    let url = settings
        .map(|s| s.geolocation_url.clone())
        .unwrap_or_else(|| AppSettings::default().geolocation_url);
    let channels = start_geolocation_worker(url);
    println!("[INIT] Geolocation worker started");
    commands.insert_resource(channels);
}

pub fn apply_geolocation_results(
    channels: Option<Res<GeolocationChannels>>,
    settings: Option<Res<AppSettings>>,
    mut observer: ResMut<ObserverState>,
) {
    let Some(channels) = channels else { return };
    let Ok(guard) = channels.res_rx.lock() else {
        return;
    };

    // One outcome per frame, so each lookup gets its own sync.
    if let Ok(msg) = guard.try_recv() {
        match msg {
            GeolocationResult::Located {
                latitude,
                longitude,
            } => {
                info!("Observer located at {:.2}, {:.2}", latitude, longitude);
                observer.latitude = latitude;
                observer.longitude = longitude;
            }
            GeolocationResult::Failed { error } => {
                let defaults = settings.as_deref().cloned().unwrap_or_default();
                warn!(
                    "Geolocation failed ({}), using default coordinates {:.2}, {:.2}",
                    error, defaults.default_latitude, defaults.default_longitude
                );
                observer.latitude = defaults.default_latitude;
                observer.longitude = defaults.default_longitude;
            }
        }
        // Resync even when the coordinates did not move.
        observer.set_changed();
    }
}
