mod sqlite;

pub use sqlite::Database;

use sqlx::migrate::MigrateError;
use time::OffsetDateTime;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to create database directory {path}: {source}")]
    CreateDir {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("database query failed: {0}")]
    Query(#[from] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migrate(#[from] MigrateError),
    #[error("no asset with id {0}")]
    UnknownAssetId(i64),
    #[error("asset {id} is a {actual}, not a weather station")]
    NotAWeatherStation { id: i64, actual: String },
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct WeatherStation {
    pub id: i64,
    pub name: String,
    pub station_type: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct WeatherSensor {
    pub id: i64,
    pub station_id: i64,
    pub name: String,
    pub unit: String,
    pub event_resolution_mins: i64,
    pub timezone: String,
    pub daily_seasonality: bool,
    pub weekly_seasonality: bool,
    pub yearly_seasonality: bool,
}

/// A sensor joined with its station's coordinates, as returned by the
/// closest-sensor lookup.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct LocatedSensor {
    pub id: i64,
    pub station_id: i64,
    pub name: String,
    pub unit: String,
    pub event_resolution_mins: i64,
    pub station_latitude: f64,
    pub station_longitude: f64,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct DataSource {
    pub id: i64,
    pub name: String,
    pub source_type: String,
}

/// A belief about a sensor value, to be recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBelief {
    pub sensor_id: i64,
    pub event_start: OffsetDateTime,
    pub belief_horizon_secs: i64,
    pub event_value: f64,
    pub source_id: i64,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TimedBelief {
    pub sensor_id: i64,
    /// Unix seconds, UTC.
    pub event_start: i64,
    pub belief_horizon_secs: i64,
    pub event_value: f64,
    pub source_id: i64,
}

/// Outcome of a belief batch write. Duplicates are skipped, not errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub inserted: u64,
    pub skipped: u64,
}
