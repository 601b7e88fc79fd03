use std::env;
use std::path::PathBuf;

use beliefcast_core::{
    find_config_file, load_config, ConfigSource, DEFAULT_BASE_URL, DEFAULT_DATA_DIR,
    DEFAULT_DB_DIR, DEFAULT_MAX_DEGREE_DIFFERENCE, DEFAULT_SOURCE_NAME, DEFAULT_STATION_NAME,
};
use clap::{Parser, Subcommand};
use slog::{o, Drain, Level, Logger};

use crate::locating::GridMethod;

#[derive(Parser, Clone, Debug)]
#[command(
    author,
    version,
    about = "Registers weather sensors and records hourly forecasts as timed beliefs"
)]
pub struct Cli {
    /// Path to config file (TOML format)
    /// Searched in order: this flag, $BELIEFCAST_CONFIG, ./beliefcast.toml,
    /// $XDG_CONFIG_HOME/beliefcast/beliefcast.toml, /etc/beliefcast/beliefcast.toml
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, global = true, env = "BELIEFCAST_LEVEL")]
    pub level: Option<String>,

    /// OpenWeatherMap API key
    #[arg(long, global = true, env = "OPENWEATHERMAP_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Directory holding the sqlite database
    #[arg(long, global = true, env = "BELIEFCAST_DATABASE")]
    pub database: Option<String>,

    /// Directory raw forecast files are written under
    #[arg(long, global = true, env = "BELIEFCAST_DATA_DIR")]
    pub data_dir: Option<String>,

    /// Data source name beliefs are attributed to
    #[arg(long, global = true, env = "BELIEFCAST_SOURCE_NAME")]
    pub source_name: Option<String>,

    /// Name given to newly created weather stations
    #[arg(long, global = true, env = "BELIEFCAST_STATION_NAME")]
    pub station_name: Option<String>,

    /// How far away (degrees) a registered sensor may sit before a
    /// location is skipped
    #[arg(long, global = true, env = "BELIEFCAST_MAX_DEGREE_DIFFERENCE")]
    pub max_degree_difference: Option<f64>,

    /// Weather provider base URL
    #[arg(long, global = true, env = "BELIEFCAST_BASE_URL")]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Register a weather sensor (and its station, if needed)
    RegisterWeatherSensor(RegisterArgs),
    /// Fetch hourly forecasts and store them in the database or as files
    GetWeatherForecasts(ForecastArgs),
}

#[derive(clap::Args, Clone, Debug)]
pub struct RegisterArgs {
    /// Sensor name: temperature, wind speed, cloud cover or irradiance
    #[arg(long)]
    pub name: String,

    /// Register on an existing weather station instead of by coordinates
    #[arg(long, conflicts_with_all = ["latitude", "longitude"])]
    pub asset_id: Option<i64>,

    /// Station latitude in decimal degrees
    #[arg(long, requires = "longitude")]
    pub latitude: Option<f64>,

    /// Station longitude in decimal degrees
    #[arg(long, requires = "latitude")]
    pub longitude: Option<f64>,

    /// IANA timezone the sensor reports in
    #[arg(long, default_value = "UTC")]
    pub timezone: String,
}

#[derive(clap::Args, Clone, Debug)]
pub struct ForecastArgs {
    /// "lat,lon" for a point, or "lat1,lon1:lat2,lon2" for a bounding box
    #[arg(long)]
    pub location: Option<String>,

    /// Take the location from an existing weather station instead
    #[arg(long, conflicts_with = "location")]
    pub asset_id: Option<i64>,

    /// Record forecasts as timed beliefs in the database (the default)
    #[arg(long, overrides_with = "store_as_json_files")]
    pub store_in_db: bool,

    /// Write raw forecasts as JSON files instead
    #[arg(long, overrides_with = "store_in_db")]
    pub store_as_json_files: bool,

    /// Number of cells a bounding box is split into
    #[arg(long, default_value_t = 1)]
    pub num_cells: usize,

    /// Grid layout for bounding boxes
    #[arg(long, value_enum, default_value_t = GridMethod::Hex)]
    pub method: GridMethod,

    /// Subdirectory of the data directory for JSON output
    #[arg(long, default_value = "")]
    pub region: String,
}

impl ForecastArgs {
    /// Database storage is the default; --store-as-json-files opts out.
    pub fn stores_in_db(&self) -> bool {
        !self.store_as_json_files
    }
}

impl Cli {
    /// Get the effective configuration value with defaults
    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn database(&self) -> PathBuf {
        PathBuf::from(self.database.clone().unwrap_or_else(|| DEFAULT_DB_DIR.to_string()))
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(self.data_dir.clone().unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()))
    }

    pub fn source_name(&self) -> String {
        self.source_name
            .clone()
            .unwrap_or_else(|| DEFAULT_SOURCE_NAME.to_string())
    }

    pub fn station_name(&self) -> String {
        self.station_name
            .clone()
            .unwrap_or_else(|| DEFAULT_STATION_NAME.to_string())
    }

    pub fn max_degree_difference(&self) -> f64 {
        self.max_degree_difference
            .unwrap_or(DEFAULT_MAX_DEGREE_DIFFERENCE)
    }
}

/// Optional settings a config file may carry; flags and env vars win.
#[derive(serde::Deserialize, Default)]
pub struct FileConfig {
    pub level: Option<String>,
    pub api_key: Option<String>,
    pub database: Option<String>,
    pub data_dir: Option<String>,
    pub source_name: Option<String>,
    pub station_name: Option<String>,
    pub max_degree_difference: Option<f64>,
    pub base_url: Option<String>,
}

/// Load configuration from CLI args, config file, and environment
pub fn get_config_info() -> Cli {
    let cli_args = Cli::parse();

    let source = if let Some(ref path) = cli_args.config {
        ConfigSource::Explicit(path.into())
    } else {
        find_config_file("BELIEFCAST_CONFIG", "beliefcast.toml")
    };

    let file_config: FileConfig = load_config(&source).unwrap_or_default();

    // CLI args override file config (env vars are handled by clap)
    Cli {
        level: cli_args.level.or(file_config.level),
        api_key: cli_args.api_key.or(file_config.api_key),
        database: cli_args.database.or(file_config.database),
        data_dir: cli_args.data_dir.or(file_config.data_dir),
        source_name: cli_args.source_name.or(file_config.source_name),
        station_name: cli_args.station_name.or(file_config.station_name),
        max_degree_difference: cli_args
            .max_degree_difference
            .or(file_config.max_degree_difference),
        base_url: cli_args.base_url.or(file_config.base_url),
        ..cli_args
    }
}

pub fn setup_logger(cli: &Cli) -> Logger {
    let log_level = if let Some(level) = cli.level.as_ref() {
        parse_level(level)
    } else {
        let rust_log = env::var("RUST_LOG").unwrap_or_default();
        parse_level(&rust_log)
    };

    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::CompactFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = drain.filter_level(log_level).fuse();
    slog::Logger::root(drain, o!("version" => env!("CARGO_PKG_VERSION")))
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::Trace,
        "debug" => Level::Debug,
        "info" => Level::Info,
        "warn" => Level::Warning,
        "error" => Level::Error,
        _ => Level::Info,
    }
}
