//! The register-weather-sensor command.

use anyhow::{anyhow, bail, Result};
use slog::Logger;
use validator::Validate;

use crate::cli::{Cli, RegisterArgs};
use crate::db::{Database, WeatherSensor};
use crate::schemas::{validation_messages, WeatherSensorSchema};
use crate::sensor_specs::spec_by_name;
use crate::WEATHER_STATION_TYPE;

#[derive(Debug, Clone, PartialEq)]
pub enum RegisterOutcome {
    Created(WeatherSensor),
    /// The station already carries a sensor with this name. Not an error:
    /// re-running a registration script should be harmless.
    AlreadyRegistered,
}

pub async fn run(cli: &Cli, args: &RegisterArgs, logger: &Logger) -> Result<()> {
    let db = Database::new(&cli.database()).await?;
    register_weather_sensor(&db, logger, &cli.station_name(), args).await?;
    Ok(())
}

pub async fn register_weather_sensor(
    db: &Database,
    logger: &Logger,
    station_name: &str,
    args: &RegisterArgs,
) -> Result<RegisterOutcome> {
    let schema = WeatherSensorSchema {
        name: args.name.clone(),
        timezone: args.timezone.clone(),
        latitude: args.latitude,
        longitude: args.longitude,
    };
    if let Err(errors) = schema.validate() {
        bail!("invalid registration:\n  {}", validation_messages(&errors).join("\n  "));
    }
    let spec = spec_by_name(&args.name)
        .ok_or_else(|| anyhow!("unsupported sensor name {:?}", args.name))?;

    let station = match (args.asset_id, args.latitude, args.longitude) {
        (Some(id), _, _) => db.station_by_id(id).await?,
        (None, Some(lat), Some(lng)) => {
            db.get_or_create_station(lat, lng, station_name, WEATHER_STATION_TYPE)
                .await?
        }
        _ => bail!("provide either --asset-id or both --latitude and --longitude"),
    };

    let name = spec.kind.name();
    if db.sensor_at_station(station.id, name).await?.is_some() {
        slog::warn!(logger, "sensor already registered, nothing to do";
            "sensor" => name, "station_id" => station.id);
        return Ok(RegisterOutcome::AlreadyRegistered);
    }

    let sensor = db.create_sensor(station.id, spec, &args.timezone).await?;
    slog::info!(logger, "sensor registered";
        "sensor" => name, "unit" => sensor.unit.as_str(),
        "station_id" => station.id,
        "lat" => station.latitude, "lng" => station.longitude);
    Ok(RegisterOutcome::Created(sensor))
}
