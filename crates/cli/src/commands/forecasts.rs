//! The get-weather-forecasts command.

use anyhow::{anyhow, bail, Result};
use slog::Logger;

use crate::cli::{Cli, ForecastArgs};
use crate::db::Database;
use crate::filing::make_file_path;
use crate::ingesting::{ForecastIngestor, IngestConfig};
use crate::locating::{parse_locations, LatLng};
use crate::owm::OwmClient;

pub async fn run(cli: &Cli, args: &ForecastArgs, logger: &Logger) -> Result<()> {
    let api_key = cli
        .api_key
        .clone()
        .ok_or_else(|| anyhow!("setting OPENWEATHERMAP_API_KEY is not available"))?;

    let provider = OwmClient::new(&cli.base_url(), &api_key, logger.clone())?;
    let ingestor = ForecastIngestor::new(provider, logger.clone());

    if args.stores_in_db() {
        let db = Database::new(&cli.database()).await?;
        let locations = resolve_locations(&db, args).await?;
        let config = IngestConfig {
            source_name: cli.source_name(),
            max_degree_difference: cli.max_degree_difference(),
        };
        let report = ingestor
            .save_forecasts_in_db(&db, &config, &locations)
            .await?;
        slog::info!(logger, "ingestion finished";
            "locations" => report.locations,
            "beliefs_inserted" => report.inserted,
            "duplicates_skipped" => report.skipped,
            "sensors_skipped" => report.sensors_skipped);
    } else {
        // Asset lookup needs the database even in file mode
        let locations = match args.asset_id {
            Some(_) => {
                let db = Database::new(&cli.database()).await?;
                resolve_locations(&db, args).await?
            }
            None => parse_from_args(args)?,
        };
        let dir = make_file_path(&cli.data_dir(), &args.region);
        let written = ingestor.save_forecasts_as_json(&locations, &dir).await?;
        slog::info!(logger, "forecasts written to files"; "files" => written.len());
    }
    Ok(())
}

async fn resolve_locations(db: &Database, args: &ForecastArgs) -> Result<Vec<LatLng>> {
    if let Some(id) = args.asset_id {
        let station = db.station_by_id(id).await?;
        return Ok(vec![LatLng::new(station.latitude, station.longitude)]);
    }
    parse_from_args(args)
}

fn parse_from_args(args: &ForecastArgs) -> Result<Vec<LatLng>> {
    let Some(ref location) = args.location else {
        bail!("provide either --location or --asset-id");
    };
    Ok(parse_locations(location, args.num_cells, args.method)?)
}
