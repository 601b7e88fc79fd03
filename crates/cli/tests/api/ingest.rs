use beliefcast_cli::ingesting::{ForecastIngestor, IngestConfig, IngestError};
use beliefcast_cli::locating::LatLng;

use crate::helpers::{hourly, register, test_db, test_logger, MockProvider};

// 2023-06-21 12:00 UTC
const API_TIME: i64 = 1687348800;

fn config() -> IngestConfig {
    IngestConfig {
        source_name: "OpenWeatherMap".to_string(),
        max_degree_difference: 2.0,
    }
}

fn provider_with(entries: Vec<beliefcast_cli::owm::HourlyForecast>) -> MockProvider {
    let api_time = time::OffsetDateTime::from_unix_timestamp(API_TIME).unwrap();
    let mut provider = MockProvider::new();
    provider
        .expect_fetch()
        .returning(move |_| Ok((api_time, entries.clone())));
    provider
}

#[tokio::test]
async fn hourly_values_become_beliefs_and_reruns_skip_duplicates() {
    let db = test_db().await;
    register(&db, "wind speed", 52.1, 5.2).await;

    let provider = provider_with(vec![
        hourly(API_TIME + 3600, &[("wind_speed", 100.0), ("temp", 18.0)]),
        hourly(API_TIME + 7200, &[("wind_speed", 90.0), ("temp", 17.5)]),
    ]);
    let ingestor = ForecastIngestor::new(provider, test_logger());
    let locations = [LatLng::new(52.1, 5.2)];

    let report = ingestor
        .save_forecasts_in_db(&db, &config(), &locations)
        .await
        .unwrap();
    assert_eq!(report.locations, 1);
    assert_eq!(report.inserted, 2);
    assert_eq!(report.skipped, 0);
    // temperature, cloud cover and irradiance have no registered sensor
    assert_eq!(report.sensors_skipped, 3);

    let sensor = db
        .find_closest_sensor("wind speed", 52.1, 5.2)
        .await
        .unwrap()
        .unwrap();
    let beliefs = db.beliefs_for_sensor(sensor.id).await.unwrap();
    assert_eq!(beliefs.len(), 2);
    assert_eq!(beliefs[0].event_value, 100.0);
    assert_eq!(beliefs[0].event_start, API_TIME + 3600);
    assert_eq!(beliefs[0].belief_horizon_secs, 3600);
    assert_eq!(beliefs[1].event_value, 90.0);
    assert_eq!(beliefs[1].belief_horizon_secs, 7200);

    // Same forecasts again: nothing new to record
    let rerun = ingestor
        .save_forecasts_in_db(&db, &config(), &locations)
        .await
        .unwrap();
    assert_eq!(rerun.inserted, 0);
    assert_eq!(rerun.skipped, 2);
}

#[tokio::test]
async fn locations_without_a_nearby_sensor_are_skipped_not_fatal() {
    let db = test_db().await;
    register(&db, "wind speed", 0.0, 0.0).await;

    let provider = provider_with(vec![hourly(API_TIME + 3600, &[("wind_speed", 5.0)])]);
    let ingestor = ForecastIngestor::new(provider, test_logger());

    let report = ingestor
        .save_forecasts_in_db(&db, &config(), &[LatLng::new(52.1, 5.2)])
        .await
        .unwrap();
    assert_eq!(report.inserted, 0);
    assert_eq!(report.sensors_skipped, 4);
}

#[tokio::test]
async fn sensor_tolerance_applies_per_axis() {
    let db = test_db().await;
    register(&db, "wind speed", 0.0, 0.0).await;

    let provider = provider_with(vec![hourly(API_TIME + 3600, &[("wind_speed", 5.0)])]);
    let ingestor = ForecastIngestor::new(provider, test_logger());

    // 1.5 degrees off on both axes is within a 2.0 degree tolerance,
    // even though the straight-line distance exceeds it
    let report = ingestor
        .save_forecasts_in_db(&db, &config(), &[LatLng::new(1.5, 1.5)])
        .await
        .unwrap();
    assert_eq!(report.inserted, 1);
    assert_eq!(report.sensors_skipped, 3);

    // But exceeding the tolerance on a single axis skips the location
    let provider = provider_with(vec![hourly(API_TIME + 3600, &[("wind_speed", 5.0)])]);
    let ingestor = ForecastIngestor::new(provider, test_logger());
    let report = ingestor
        .save_forecasts_in_db(&db, &config(), &[LatLng::new(2.5, 0.0)])
        .await
        .unwrap();
    assert_eq!(report.inserted, 0);
    assert_eq!(report.sensors_skipped, 4);
}

#[tokio::test]
async fn mismatched_sensor_resolution_aborts_the_run() {
    let db = test_db().await;
    register(&db, "wind speed", 52.1, 5.2).await;

    // Corrupt the stored resolution to simulate a misconfigured sensor
    sqlx::query("UPDATE weather_sensors SET event_resolution_mins = 15 WHERE name = 'wind speed'")
        .execute(db.pool())
        .await
        .unwrap();

    let provider = provider_with(vec![hourly(API_TIME + 3600, &[("wind_speed", 5.0)])]);
    let ingestor = ForecastIngestor::new(provider, test_logger());

    let err = ingestor
        .save_forecasts_in_db(&db, &config(), &[LatLng::new(52.1, 5.2)])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        IngestError::ResolutionMismatch {
            ref sensor,
            actual: 15,
            expected: 60,
        } if sensor == "wind speed"
    ));
}

#[tokio::test]
async fn irradiance_is_derived_and_attributed_separately() {
    let db = test_db().await;
    register(&db, "cloud cover", 52.1, 5.2).await;
    register(&db, "irradiance", 52.1, 5.2).await;

    // Event at local night: derived irradiance must come out as zero
    let midnight = 1687305600; // 2023-06-21 00:00 UTC
    let api_time = time::OffsetDateTime::from_unix_timestamp(midnight - 3600).unwrap();
    let entries = vec![hourly(midnight, &[("clouds", 50.0)])];
    let mut provider = MockProvider::new();
    provider
        .expect_fetch()
        .returning(move |_| Ok((api_time, entries.clone())));

    let ingestor = ForecastIngestor::new(provider, test_logger());
    let report = ingestor
        .save_forecasts_in_db(&db, &config(), &[LatLng::new(52.1, 5.2)])
        .await
        .unwrap();
    assert_eq!(report.inserted, 2);

    let clouds = db
        .find_closest_sensor("cloud cover", 52.1, 5.2)
        .await
        .unwrap()
        .unwrap();
    let cloud_beliefs = db.beliefs_for_sensor(clouds.id).await.unwrap();
    assert_eq!(cloud_beliefs.len(), 1);
    assert_eq!(cloud_beliefs[0].event_value, 50.0);

    let irradiance = db
        .find_closest_sensor("irradiance", 52.1, 5.2)
        .await
        .unwrap()
        .unwrap();
    let irradiance_beliefs = db.beliefs_for_sensor(irradiance.id).await.unwrap();
    assert_eq!(irradiance_beliefs.len(), 1);
    assert_eq!(irradiance_beliefs[0].event_value, 0.0);

    // Raw and derived values carry distinct data sources
    let raw_source = db
        .get_or_create_source("OpenWeatherMap", "forecaster")
        .await
        .unwrap();
    let derived_source = db
        .get_or_create_source("OpenWeatherMap (derived)", "forecaster")
        .await
        .unwrap();
    assert_eq!(cloud_beliefs[0].source_id, raw_source.id);
    assert_eq!(irradiance_beliefs[0].source_id, derived_source.id);
}

#[tokio::test]
async fn missing_fields_are_skipped_per_entry() {
    let db = test_db().await;
    register(&db, "temperature", 52.1, 5.2).await;

    let provider = provider_with(vec![
        hourly(API_TIME + 3600, &[("temp", 18.0)]),
        hourly(API_TIME + 7200, &[("wind_speed", 4.0)]),
    ]);
    let ingestor = ForecastIngestor::new(provider, test_logger());

    let report = ingestor
        .save_forecasts_in_db(&db, &config(), &[LatLng::new(52.1, 5.2)])
        .await
        .unwrap();
    assert_eq!(report.inserted, 1);
}

#[tokio::test]
async fn empty_forecast_batch_for_a_registered_sensor_is_an_error() {
    let db = test_db().await;
    register(&db, "temperature", 52.1, 5.2).await;

    let provider = provider_with(Vec::new());
    let ingestor = ForecastIngestor::new(provider, test_logger());

    let err = ingestor
        .save_forecasts_in_db(&db, &config(), &[LatLng::new(52.1, 5.2)])
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::EmptyBatch { ref sensor } if sensor == "temperature"));
}
