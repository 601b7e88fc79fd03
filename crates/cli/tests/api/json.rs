use beliefcast_cli::ingesting::ForecastIngestor;
use beliefcast_cli::locating::LatLng;
use beliefcast_cli::owm::HourlyForecast;
use time::OffsetDateTime;

use crate::helpers::{hourly, test_logger, MockProvider};

#[tokio::test]
async fn raw_forecasts_land_in_a_per_run_directory() {
    let data_dir = tempfile::tempdir().unwrap();
    let api_time = OffsetDateTime::from_unix_timestamp(1687348800).unwrap();
    let entries = vec![
        hourly(1687352400, &[("temp", 18.0), ("clouds", 75.0)]),
        hourly(1687356000, &[("temp", 17.5), ("clouds", 100.0)]),
    ];

    let returned = entries.clone();
    let mut provider = MockProvider::new();
    provider
        .expect_fetch()
        .returning(move |_| Ok((api_time, returned.clone())));

    let ingestor = ForecastIngestor::new(provider, test_logger());
    let written = ingestor
        .save_forecasts_as_json(&[LatLng::new(52.1, 5.2)], data_dir.path())
        .await
        .unwrap();

    assert_eq!(written.len(), 1);
    let path = &written[0];
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "forecast_lat_52.1_lng_5.2.json"
    );
    // Run directory is named after the provider's reported call time
    let run_dir = path.parent().unwrap();
    assert_eq!(run_dir.file_name().unwrap().to_str().unwrap(), "2023-06-21T12-00-00");
    assert_eq!(run_dir.parent().unwrap(), data_dir.path());

    let body = tokio::fs::read(path).await.unwrap();
    let read_back: Vec<HourlyForecast> = serde_json::from_slice(&body).unwrap();
    assert_eq!(read_back.len(), 2);
    assert_eq!(read_back[0].value("temp"), Some(18.0));
    assert_eq!(read_back[1].value("clouds"), Some(100.0));
}

#[tokio::test]
async fn one_file_per_grid_location() {
    let data_dir = tempfile::tempdir().unwrap();
    let api_time = OffsetDateTime::from_unix_timestamp(1687348800).unwrap();

    let mut provider = MockProvider::new();
    provider
        .expect_fetch()
        .times(3)
        .returning(move |_| Ok((api_time, vec![hourly(1687352400, &[("temp", 18.0)])])));

    let locations = [
        LatLng::new(52.0, 5.0),
        LatLng::new(52.0, 6.0),
        LatLng::new(51.0, 5.5),
    ];
    let ingestor = ForecastIngestor::new(provider, test_logger());
    let written = ingestor
        .save_forecasts_as_json(&locations, data_dir.path())
        .await
        .unwrap();

    assert_eq!(written.len(), 3);
    for (path, location) in written.iter().zip(locations) {
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            format!("forecast_lat_{}_lng_{}.json", location.lat, location.lng)
        );
        assert!(path.exists());
    }
}
