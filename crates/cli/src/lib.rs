pub mod cli;
pub mod commands;
pub mod db;
pub mod filing;
pub mod ingesting;
pub mod locating;
pub mod owm;
pub mod radiating;
pub mod schemas;
pub mod sensor_specs;

pub use beliefcast_core::{DEFAULT_SOURCE_NAME, SOURCE_TYPE, WEATHER_STATION_TYPE};

pub use cli::{get_config_info, setup_logger, Cli, Command};
