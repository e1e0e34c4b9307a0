use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::settings::WeatherSettings;

pub const OPEN_METEO_URL: &str = "https://api.open-meteo.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// One-line human summary of current conditions.
    async fn current_summary(&self) -> Result<String>;
}

/// Text for a WMO weather interpretation code.
pub fn weather_code_to_text(code: i64) -> &'static str {
    match code {
        0 => "Clear",
        1..=3 => "Cloudy",
        45 | 48 => "Fog",
        51 | 53 | 55 => "Drizzle",
        61 | 63 | 65 => "Rain",
        66 | 67 => "Freezing rain",
        71 | 73 | 75 | 77 => "Snow",
        80..=82 => "Showers",
        95 => "Thunderstorm",
        96 | 99 => "Thunderstorm with hail",
        _ => "Weather",
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    wind_speed_10m: f64,
    weather_code: i64,
}

pub struct OpenMeteoClient {
    http: reqwest::Client,
    base_url: String,
    location: WeatherSettings,
}

impl OpenMeteoClient {
    pub fn new(base_url: impl Into<String>, location: WeatherSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build weather HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            location,
        })
    }

    fn summarize(&self, current: &CurrentConditions) -> String {
        format!(
            "{} {:.0}°C {} humidity {}% wind {}m/s",
            self.location.location_name,
            current.temperature_2m.round(),
            weather_code_to_text(current.weather_code),
            current.relative_humidity_2m,
            current.wind_speed_10m
        )
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoClient {
    async fn current_summary(&self) -> Result<String> {
        let url = format!("{}/v1/forecast", self.base_url);
        let latitude = self.location.latitude.to_string();
        let longitude = self.location.longitude.to_string();
        let response = self
            .http
            .get(&url)
            .query(&[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                (
                    "current",
                    "temperature_2m,relative_humidity_2m,apparent_temperature,wind_speed_10m,weather_code",
                ),
                ("wind_speed_unit", "ms"),
                ("timezone", self.location.timezone.as_str()),
            ])
            .send()
            .await
            .context("weather request failed")?
            .error_for_status()
            .context("weather service returned an error")?;

        let forecast: ForecastResponse = response
            .json()
            .await
            .context("weather response was not valid JSON")?;
        Ok(self.summarize(&forecast.current))
    }
}

/// Latest successfully fetched weather summary.
pub struct WeatherCache {
    source: Arc<dyn WeatherSource>,
    latest: Mutex<Option<String>>,
}

impl WeatherCache {
    pub fn new(source: Arc<dyn WeatherSource>) -> Self {
        Self {
            source,
            latest: Mutex::new(None),
        }
    }

    pub fn latest(&self) -> Option<String> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fetches fresh conditions; on failure the previous summary stays.
    pub async fn refresh(&self) -> Option<String> {
        match self.source.current_summary().await {
            Ok(summary) => {
                debug!("Weather refreshed: {summary}");
                *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(summary.clone());
                Some(summary)
            }
            Err(err) => {
                warn!("Weather refresh failed: {err:#}");
                self.latest()
            }
        }
    }

    /// Refreshes immediately and then every `every`.
    pub fn spawn_refresh_loop(self: &Arc<Self>, runtime: &Handle, every: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        runtime.spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                cache.refresh().await;
            }
        })
    }
}
