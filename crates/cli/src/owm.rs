//! OpenWeatherMap "one call" client.
//!
//! One request per location returns the current conditions plus 48 hourly
//! forecast entries. We keep the hourly entries schemaless beyond their
//! timestamp so new provider fields pass through untouched.

use std::collections::HashMap;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use slog::Logger;
use time::{Duration, OffsetDateTime};

use crate::locating::LatLng;

/// Skew between the provider's reported time and ours above which we warn
/// that belief horizons may be off.
pub const CLOCK_SKEW_THRESHOLD: Duration = Duration::minutes(10);

const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(20);

#[derive(thiserror::Error, Debug)]
pub enum WeatherApiError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("weather request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("weather api returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed weather response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid timestamp in weather response: {0}")]
    Timestamp(#[from] time::error::ComponentRange),
}

/// One hourly forecast entry. Only `dt` is interpreted; every other field
/// stays as raw JSON so it can be persisted or serialized verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub dt: i64,
    #[serde(flatten)]
    pub fields: HashMap<String, Value>,
}

impl HourlyForecast {
    /// Event start as a UTC datetime, truncated to the minute.
    pub fn event_start(&self) -> Result<OffsetDateTime, WeatherApiError> {
        let t = OffsetDateTime::from_unix_timestamp(self.dt)?;
        Ok(t - Duration::seconds(i64::from(t.second())))
    }

    /// Numeric value of a provider field, if present and numeric.
    pub fn value(&self, field: &str) -> Option<f64> {
        self.fields.get(field).and_then(Value::as_f64)
    }
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    dt: i64,
}

#[derive(Debug, Deserialize)]
struct OneCallResponse {
    current: CurrentConditions,
    #[serde(default)]
    hourly: Vec<HourlyForecast>,
}

/// Parse a one-call response body into the provider's own timestamp
/// (truncated to the minute, like event starts) and the hourly entries.
pub fn parse_one_call(body: &str) -> Result<(OffsetDateTime, Vec<HourlyForecast>), WeatherApiError> {
    let response: OneCallResponse = serde_json::from_str(body)?;
    let t = OffsetDateTime::from_unix_timestamp(response.current.dt)?;
    Ok((t - Duration::seconds(i64::from(t.second())), response.hourly))
}

/// How far the provider's clock is from ours, if beyond the threshold.
pub fn clock_skew(api_time: OffsetDateTime, now: OffsetDateTime) -> Option<Duration> {
    let skew = (now - api_time).abs();
    (skew > CLOCK_SKEW_THRESHOLD).then_some(skew)
}

#[async_trait]
pub trait ForecastProvider: Send + Sync {
    /// Fetch the hourly forecast for a location, returning the provider's
    /// current timestamp alongside the entries.
    async fn fetch(
        &self,
        location: LatLng,
    ) -> Result<(OffsetDateTime, Vec<HourlyForecast>), WeatherApiError>;
}

pub struct OwmClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    logger: Logger,
}

impl OwmClient {
    pub fn new(base_url: &str, api_key: &str, logger: Logger) -> Result<Self, WeatherApiError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(WeatherApiError::Client)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            logger,
        })
    }
}

#[async_trait]
impl ForecastProvider for OwmClient {
    async fn fetch(
        &self,
        location: LatLng,
    ) -> Result<(OffsetDateTime, Vec<HourlyForecast>), WeatherApiError> {
        slog::debug!(self.logger, "requesting hourly forecast";
            "lat" => location.lat, "lng" => location.lng);

        // The api key rides in the query string, so never log the url
        let url = format!("{}/data/2.5/onecall", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", location.lat.to_string()),
                ("lon", location.lng.to_string()),
                ("units", "metric".to_string()),
                ("exclude", "minutely,daily,alerts".to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status != reqwest::StatusCode::OK {
            return Err(WeatherApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        parse_one_call(&body)
    }
}
