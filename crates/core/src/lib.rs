//! Beliefcast Core Library
//!
//! Shared utilities for the beliefcast CLI:
//! - Configuration loading (XDG-compliant)
//! - File system utilities
//! - Common defaults

mod config;
pub mod fs;

pub use config::{find_config_file, load_config, ConfigSource};

/// Application name used for XDG paths
pub const APP_NAME: &str = "beliefcast";

/// Base URL of the OpenWeatherMap API
pub const DEFAULT_BASE_URL: &str = "http://api.openweathermap.org";

/// Name given to lazily created weather stations
pub const DEFAULT_STATION_NAME: &str = "weather station";

/// Asset type of weather stations
pub const WEATHER_STATION_TYPE: &str = "weather station";

/// Name of the data source beliefs are attributed to
pub const DEFAULT_SOURCE_NAME: &str = "OpenWeatherMap";

/// Type of the data source beliefs are attributed to
pub const SOURCE_TYPE: &str = "forecaster";

/// How far (in degrees, per axis) a registered sensor may be from a
/// requested location before it is considered too far away
pub const DEFAULT_MAX_DEGREE_DIFFERENCE: f64 = 2.0;

/// Default directory for raw JSON forecast files
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Default directory holding the sqlite database
pub const DEFAULT_DB_DIR: &str = "./db";
