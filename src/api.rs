//! Weather API client for the Oikolab reanalysis service
//!
//! This module provides HTTP client functionality for retrieving hourly
//! ERA5 reanalysis data with retry logic and error handling. The core
//! pipeline consumes data through the [`WeatherSource`] trait so the
//! transformation is testable without network access.

use crate::config::EpwGenConfig;
use crate::models::HourlySeries;
use crate::{EpwGenError, Result};
use chrono::DateTime;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

/// The reanalysis variables requested for EPW generation
pub const EPW_PARAMETERS: [&str; 21] = [
    "temperature",
    "dewpoint_temperature",
    "surface_solar_radiation",
    "surface_thermal_radiation",
    "surface_direct_solar_radiation",
    "surface_diffuse_solar_radiation",
    "direct_normal_solar_radiation",
    "relative_humidity",
    "wind_speed",
    "wind_direction",
    "surface_pressure",
    "total_cloud_cover",
    "total_precipitation",
    "soil_temperature_level_3",
    "soil_temperature_level_4",
    "forecast_albedo",
    "cloud_base_height",
    "total_column_rain_water",
    "snow_depth",
    "snow_density",
    "snowfall",
];

/// Metadata column holding the location's UTC offset in hours
pub const COL_UTC_OFFSET: &str = "utc_offset (hrs)";
/// Metadata column holding the reanalysis model surface elevation
pub const COL_MODEL_ELEVATION: &str = "model elevation (surface)";

/// Raw hourly data for an EPW fetch window plus location metadata
#[derive(Debug, Clone)]
pub struct FetchedWindow {
    /// Hourly series indexed by UTC timestamp
    pub series: HourlySeries,
    /// UTC offset of the location in hours
    pub utc_offset: f64,
    /// Model surface elevation of the location in meters
    pub elevation: f64,
}

/// Source of raw hourly weather data for a target year.
///
/// The fetch window extends one day before and after the calendar year so
/// the transformation can shift timestamps into local time without losing
/// edge hours.
pub trait WeatherSource {
    fn fetch_epw_window(&self, latitude: f64, longitude: f64, year: i32) -> Result<FetchedWindow>;
}

/// Weather API client for Oikolab
pub struct OikolabClient {
    /// HTTP client
    client: reqwest::blocking::Client,
    /// API configuration
    config: EpwGenConfig,
    /// API key sent with every request
    api_key: String,
}

impl OikolabClient {
    /// Create a new weather API client. Fails when no API key is
    /// configured, since the reanalysis API rejects anonymous requests.
    pub fn new(config: EpwGenConfig) -> Result<Self> {
        let api_key = config.weather.api_key.clone().ok_or_else(|| {
            EpwGenError::config(
                "No weather API key configured. Set weather.api_key in the config file.",
            )
        })?;

        let timeout = Duration::from_secs(config.weather.timeout_seconds.into());
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("epwgen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EpwGenError::fetch(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    /// Fetch the hourly reanalysis window needed to build an EPW file for
    /// `year`, including the location's UTC offset and elevation metadata.
    #[instrument(skip(self))]
    pub fn fetch_epw_year(
        &self,
        latitude: f64,
        longitude: f64,
        year: i32,
    ) -> Result<FetchedWindow> {
        // One day of margin on both sides for the timezone shift
        let start = format!("{}-12-31", year - 1);
        let end = format!("{}-01-02", year + 1);

        info!(
            "Fetching reanalysis window {} to {} for {:.4}, {:.4}",
            start, end, latitude, longitude
        );
        let start_time = Instant::now();

        let mut query: Vec<(&str, String)> = EPW_PARAMETERS
            .iter()
            .map(|p| ("param", (*p).to_string()))
            .collect();
        query.push(("lat", latitude.to_string()));
        query.push(("lon", longitude.to_string()));
        query.push(("start", start));
        query.push(("end", end));

        let response = self.make_request(&query)?;
        let series = parse_weather_payload(&response)?;

        let utc_offset = series.scalar(COL_UTC_OFFSET)?;
        let elevation = series.scalar(COL_MODEL_ELEVATION)?;

        info!(
            "Fetched {} hourly rows in {:.3}s (utc offset {} h, elevation {} m)",
            series.len(),
            start_time.elapsed().as_secs_f64(),
            utc_offset,
            elevation
        );

        Ok(FetchedWindow {
            series,
            utc_offset,
            elevation,
        })
    }

    /// Ad hoc weather query: caller-chosen variables, window and sampling
    /// frequency, returned as a plain series without any EPW processing.
    #[instrument(skip(self, parameters))]
    pub fn query_weather(
        &self,
        parameters: &[&str],
        latitude: f64,
        longitude: f64,
        start: &str,
        end: &str,
        freq: &str,
    ) -> Result<HourlySeries> {
        info!(
            "Ad hoc weather query for {} variables, {} to {}",
            parameters.len(),
            start,
            end
        );

        let mut query: Vec<(&str, String)> = parameters
            .iter()
            .map(|p| ("param", (*p).to_string()))
            .collect();
        query.push(("lat", latitude.to_string()));
        query.push(("lon", longitude.to_string()));
        query.push(("start", start.to_string()));
        query.push(("end", end.to_string()));
        query.push(("freq", freq.to_string()));

        let response = self.make_request(&query)?;
        parse_weather_payload(&response)
    }

    /// Make a request with retry logic. A non-2xx response is an error,
    /// never an empty dataset.
    fn make_request(&self, query: &[(&str, String)]) -> Result<String> {
        let url = format!("{}/weather", self.config.weather.base_url);
        let max_attempts = self.config.weather.max_retries + 1;
        let mut attempt = 0;

        debug!("Starting HTTP request (max attempts: {})", max_attempts);

        loop {
            let attempt_start = Instant::now();

            let result = self
                .client
                .get(&url)
                .header("api-key", &self.api_key)
                .query(query)
                .send();

            match result {
                Ok(response) => {
                    let status = response.status();
                    debug!(
                        "HTTP response received: {} in {:.3}s",
                        status,
                        attempt_start.elapsed().as_secs_f64()
                    );

                    if status.is_success() {
                        return response.text().map_err(|e| {
                            EpwGenError::fetch(format!("Failed to read response body: {e}"))
                        });
                    }

                    if status.as_u16() == 401 || status.as_u16() == 403 {
                        error!("API authentication failed (HTTP {})", status.as_u16());
                        return Err(EpwGenError::fetch(
                            "Invalid API key. Please check your Oikolab API key.",
                        ));
                    }

                    let error_msg = format!(
                        "API request failed with status: {} - {}",
                        status,
                        status.canonical_reason().unwrap_or("Unknown error")
                    );
                    warn!("HTTP error on attempt {}: {}", attempt + 1, error_msg);

                    if attempt < max_attempts - 1 && (status.is_server_error() || status.as_u16() == 429) {
                        let backoff = Duration::from_millis(1000 * 2_u64.pow(attempt));
                        debug!("Backing off {:.1}s before retry", backoff.as_secs_f64());
                        thread::sleep(backoff);
                        attempt += 1;
                        continue;
                    }

                    error!("API request failed after {} attempts: {}", attempt + 1, error_msg);
                    return Err(EpwGenError::fetch(error_msg));
                }
                Err(e) => {
                    warn!(
                        "Network error on attempt {} ({:.3}s): {}",
                        attempt + 1,
                        attempt_start.elapsed().as_secs_f64(),
                        e
                    );

                    if attempt < max_attempts - 1 {
                        let backoff = Duration::from_millis(1000 * 2_u64.pow(attempt));
                        debug!("Backing off {:.1}s before retry", backoff.as_secs_f64());
                        thread::sleep(backoff);
                        attempt += 1;
                        continue;
                    }

                    error!("Network error after {} attempts: {}", max_attempts, e);
                    return Err(EpwGenError::fetch(format!(
                        "Network error after {max_attempts} attempts: {e}"
                    )));
                }
            }
        }
    }
}

impl WeatherSource for OikolabClient {
    fn fetch_epw_window(&self, latitude: f64, longitude: f64, year: i32) -> Result<FetchedWindow> {
        self.fetch_epw_year(latitude, longitude, year)
    }
}

/// Response envelope: the hourly table arrives as a JSON string inside the
/// outer JSON document.
#[derive(Debug, Deserialize)]
struct WeatherEnvelope {
    data: String,
}

/// The inner table: epoch-second index, column names and row-major values
#[derive(Debug, Deserialize)]
struct WeatherPayload {
    index: Vec<i64>,
    columns: Vec<String>,
    data: Vec<Vec<serde_json::Value>>,
}

/// Parse the API response body into an [`HourlySeries`]
pub fn parse_weather_payload(body: &str) -> Result<HourlySeries> {
    let envelope: WeatherEnvelope = serde_json::from_str(body)
        .map_err(|e| EpwGenError::fetch(format!("Invalid weather response envelope: {e}")))?;
    let payload: WeatherPayload = serde_json::from_str(&envelope.data)
        .map_err(|e| EpwGenError::fetch(format!("Invalid weather payload: {e}")))?;

    if payload.data.len() != payload.index.len() {
        return Err(EpwGenError::fetch(format!(
            "Weather payload has {} rows for {} timestamps",
            payload.data.len(),
            payload.index.len()
        )));
    }

    let timestamps = payload
        .index
        .iter()
        .map(|&epoch| {
            DateTime::from_timestamp(epoch, 0)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| {
                    EpwGenError::fetch(format!("Timestamp {epoch} is out of range"))
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut columns: BTreeMap<String, Vec<Option<f64>>> = payload
        .columns
        .iter()
        .map(|name| (name.clone(), Vec::with_capacity(timestamps.len())))
        .collect();

    for row in &payload.data {
        if row.len() != payload.columns.len() {
            return Err(EpwGenError::fetch(format!(
                "Weather payload row has {} values for {} columns",
                row.len(),
                payload.columns.len()
            )));
        }
        for (name, value) in payload.columns.iter().zip(row) {
            if let Some(column) = columns.get_mut(name) {
                column.push(value_to_f64(value));
            }
        }
    }

    HourlySeries::new(timestamps, columns)
}

/// Numeric cells arrive as JSON numbers, occasionally as numeric strings;
/// anything else counts as missing.
fn value_to_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
