//! The forecast ingestion pipeline.
//!
//! For every requested location we make one provider call and fan the
//! hourly entries out over the supported sensors, either as timed beliefs
//! in the database or as raw JSON files on disk. A missing sensor or a
//! sensor registered too far away downgrades to a warning for that
//! location; a sensor whose resolution disagrees with the provider's is a
//! configuration error and aborts the run.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use slog::Logger;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::db::{self, Database, NewBelief};
use crate::locating::LatLng;
use crate::owm::{clock_skew, ForecastProvider, HourlyForecast, WeatherApiError};
use crate::radiating::{self, RadiationError};
use crate::sensor_specs::{SensorKind, MAPPING};
use crate::SOURCE_TYPE;

#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Api(#[from] WeatherApiError),
    #[error(transparent)]
    Db(#[from] db::Error),
    #[error(transparent)]
    Radiation(#[from] RadiationError),
    #[error(
        "sensor {sensor:?} records at {actual} minute resolution, \
         but the provider delivers {expected} minute forecasts"
    )]
    ResolutionMismatch {
        sensor: String,
        actual: i64,
        expected: i64,
    },
    #[error("provider returned no hourly forecasts for sensor {sensor:?}")]
    EmptyBatch { sensor: String },
    #[error("failed to format timestamp: {0}")]
    Format(#[from] time::error::Format),
    #[error("failed to serialize forecasts: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Data source name beliefs are attributed to. Derived values get a
    /// "(derived)" suffix on this name.
    pub source_name: String,
    /// How far away, in degrees along either axis, a registered sensor may
    /// sit before a location is skipped with a warning.
    pub max_degree_difference: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub locations: usize,
    pub inserted: u64,
    pub skipped: u64,
    /// (location, sensor) pairs skipped for a missing or too-distant sensor.
    pub sensors_skipped: usize,
}

pub struct ForecastIngestor<P> {
    provider: P,
    logger: Logger,
}

impl<P: ForecastProvider> ForecastIngestor<P> {
    pub fn new(provider: P, logger: Logger) -> Self {
        Self { provider, logger }
    }

    /// Fetch forecasts for each location and record them as timed beliefs.
    pub async fn save_forecasts_in_db(
        &self,
        db: &Database,
        config: &IngestConfig,
        locations: &[LatLng],
    ) -> Result<IngestReport, IngestError> {
        let mut report = IngestReport {
            locations: locations.len(),
            ..IngestReport::default()
        };
        let mut sources: HashMap<String, i64> = HashMap::new();

        for &location in locations {
            let (api_time, hourly) = self.fetch_checked(location).await?;
            let mut beliefs = Vec::new();

            for spec in &MAPPING {
                let Some(sensor) = self.resolve_sensor(db, config, location, spec.kind).await?
                else {
                    report.sensors_skipped += 1;
                    continue;
                };
                if hourly.is_empty() {
                    return Err(IngestError::EmptyBatch {
                        sensor: sensor.name,
                    });
                }

                let source_name = match spec.kind {
                    SensorKind::Irradiance => format!("{} (derived)", config.source_name),
                    _ => config.source_name.clone(),
                };
                let source_id = match sources.get(&source_name) {
                    Some(&id) => id,
                    None => {
                        let source = db.get_or_create_source(&source_name, SOURCE_TYPE).await?;
                        sources.insert(source_name, source.id);
                        source.id
                    }
                };

                for entry in &hourly {
                    let Some(raw) = entry.value(spec.provider_field) else {
                        slog::warn!(self.logger, "field missing from hourly entry";
                            "field" => spec.provider_field, "sensor" => sensor.name.as_str(),
                            "dt" => entry.dt);
                        continue;
                    };
                    let event_start = entry.event_start()?;
                    let event_value = match spec.kind {
                        SensorKind::Irradiance => radiating::compute_irradiance(
                            location.lat,
                            location.lng,
                            event_start,
                            raw / 100.0,
                        )?,
                        _ => raw,
                    };
                    beliefs.push(NewBelief {
                        sensor_id: sensor.id,
                        event_start,
                        belief_horizon_secs: (event_start - api_time).whole_seconds(),
                        event_value,
                        source_id,
                    });
                }
            }

            let saved = db.save_beliefs(&beliefs).await?;
            report.inserted += saved.inserted;
            report.skipped += saved.skipped;
            slog::info!(self.logger, "forecasts saved";
                "lat" => location.lat, "lng" => location.lng,
                "inserted" => saved.inserted, "skipped" => saved.skipped);
        }
        Ok(report)
    }

    /// Fetch forecasts for each location and dump the hourly entries as
    /// JSON files under a directory named after the provider's call time.
    pub async fn save_forecasts_as_json(
        &self,
        locations: &[LatLng],
        data_path: &Path,
    ) -> Result<Vec<PathBuf>, IngestError> {
        let mut written = Vec::with_capacity(locations.len());
        for &location in locations {
            let (api_time, hourly) = self.fetch_checked(location).await?;
            let run_dir = data_path.join(api_time.format(format_description!(
                "[year]-[month]-[day]T[hour]-[minute]-[second]"
            ))?);
            tokio::fs::create_dir_all(&run_dir)
                .await
                .map_err(|source| IngestError::WriteFile {
                    path: run_dir.clone(),
                    source,
                })?;
            let path = run_dir.join(format!(
                "forecast_lat_{}_lng_{}.json",
                location.lat, location.lng
            ));
            let body = serde_json::to_vec_pretty(&hourly)?;
            tokio::fs::write(&path, body)
                .await
                .map_err(|source| IngestError::WriteFile {
                    path: path.clone(),
                    source,
                })?;
            slog::info!(self.logger, "forecasts written"; "path" => %path.display());
            written.push(path);
        }
        Ok(written)
    }

    async fn fetch_checked(
        &self,
        location: LatLng,
    ) -> Result<(OffsetDateTime, Vec<HourlyForecast>), IngestError> {
        let (api_time, hourly) = self.provider.fetch(location).await?;
        if let Some(skew) = clock_skew(api_time, OffsetDateTime::now_utc()) {
            slog::warn!(self.logger,
                "provider clock disagrees with ours, belief horizons may be off";
                "skew_secs" => skew.whole_seconds());
        }
        Ok((api_time, hourly))
    }

    /// The registered sensor serving this location for a sensor kind, or
    /// None (with a warning) when there is none close enough.
    async fn resolve_sensor(
        &self,
        db: &Database,
        config: &IngestConfig,
        location: LatLng,
        kind: SensorKind,
    ) -> Result<Option<db::LocatedSensor>, IngestError> {
        let Some(sensor) = db
            .find_closest_sensor(kind.name(), location.lat, location.lng)
            .await?
        else {
            slog::warn!(self.logger, "no sensor registered, skipping";
                "sensor" => kind.name(), "lat" => location.lat, "lng" => location.lng);
            return Ok(None);
        };

        // Tolerance applies per axis, not as a straight-line distance
        let d_lat = (sensor.station_latitude - location.lat).abs();
        let d_lng = (sensor.station_longitude - location.lng).abs();
        if d_lat > config.max_degree_difference || d_lng > config.max_degree_difference {
            slog::warn!(self.logger, "closest sensor is too far away, skipping";
                "sensor" => kind.name(), "lat" => location.lat, "lng" => location.lng,
                "lat_degrees_off" => d_lat, "lng_degrees_off" => d_lng,
                "max_degrees" => config.max_degree_difference);
            return Ok(None);
        }

        let spec = crate::sensor_specs::spec_for(kind);
        if sensor.event_resolution_mins != spec.event_resolution_mins {
            return Err(IngestError::ResolutionMismatch {
                sensor: sensor.name,
                actual: sensor.event_resolution_mins,
                expected: spec.event_resolution_mins,
            });
        }
        Ok(Some(sensor))
    }
}
