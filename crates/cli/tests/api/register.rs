use beliefcast_cli::commands::register::{register_weather_sensor, RegisterOutcome};
use beliefcast_cli::db::Error;

use crate::helpers::{register_args, test_db, test_logger};

#[tokio::test]
async fn registering_creates_station_and_sensor() {
    let db = test_db().await;
    let outcome = register_weather_sensor(
        &db,
        &test_logger(),
        "weather station",
        &register_args("wind speed", 52.1, 5.2),
    )
    .await
    .unwrap();

    let RegisterOutcome::Created(sensor) = outcome else {
        panic!("expected a new sensor");
    };
    assert_eq!(sensor.name, "wind speed");
    assert_eq!(sensor.unit, "m/s");
    assert_eq!(sensor.timezone, "UTC");

    let station = db.station_by_id(sensor.station_id).await.unwrap();
    assert_eq!(station.latitude, 52.1);
    assert_eq!(station.longitude, 5.2);
}

#[tokio::test]
async fn registering_twice_is_harmless() {
    let db = test_db().await;
    let args = register_args("temperature", 52.1, 5.2);
    let logger = test_logger();

    let first = register_weather_sensor(&db, &logger, "weather station", &args)
        .await
        .unwrap();
    assert!(matches!(first, RegisterOutcome::Created(_)));

    let second = register_weather_sensor(&db, &logger, "weather station", &args)
        .await
        .unwrap();
    assert_eq!(second, RegisterOutcome::AlreadyRegistered);
}

#[tokio::test]
async fn stations_are_shared_between_sensors_at_the_same_location() {
    let db = test_db().await;
    let logger = test_logger();

    for name in ["temperature", "wind speed", "cloud cover", "irradiance"] {
        register_weather_sensor(&db, &logger, "weather station", &register_args(name, 52.1, 5.2))
            .await
            .unwrap();
    }

    // All four sensors landed on one station
    let sensor = db.find_closest_sensor("irradiance", 52.1, 5.2).await.unwrap().unwrap();
    for name in ["temperature", "wind speed", "cloud cover"] {
        assert!(db
            .sensor_at_station(sensor.station_id, name)
            .await
            .unwrap()
            .is_some());
    }
}

#[tokio::test]
async fn invalid_input_reports_every_problem() {
    let db = test_db().await;
    let mut args = register_args("humidity", 91.0, -200.0);
    args.timezone = "Mars/Olympus".to_string();

    let err = register_weather_sensor(&db, &test_logger(), "weather station", &args)
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("unsupported sensor name"));
    assert!(message.contains("latitude must lie within [-90, 90]"));
    assert!(message.contains("longitude must lie within [-180, 180]"));
    assert!(message.contains("not a known IANA timezone"));
}

#[tokio::test]
async fn unknown_asset_id_is_rejected() {
    let db = test_db().await;
    let mut args = register_args("temperature", 0.0, 0.0);
    args.latitude = None;
    args.longitude = None;
    args.asset_id = Some(99);

    let err = register_weather_sensor(&db, &test_logger(), "weather station", &args)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::UnknownAssetId(99))
    ));
}
