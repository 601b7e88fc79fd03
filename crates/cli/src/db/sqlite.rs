use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use super::{
    DataSource, Error, LocatedSensor, NewBelief, SaveReport, TimedBelief, WeatherSensor,
    WeatherStation,
};
use crate::sensor_specs::SensorSpec;

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(path: &Path) -> Result<Self, Error> {
        beliefcast_core::fs::create_dir_all(path).map_err(|source| Error::CreateDir {
            path: path.to_path_buf(),
            source,
        })?;
        let db_path = path.join("beliefs.sqlite");

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))
            .map_err(sqlx::Error::from)?
            .create_if_missing(true)
            .pragma("journal_mode", "WAL")
            .pragma("synchronous", "NORMAL")
            .pragma("busy_timeout", "5000")
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// An in-memory database for tests. A single connection keeps all
    /// queries on the same memory store.
    pub async fn in_memory() -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(sqlx::Error::from)?
            .pragma("foreign_keys", "ON");
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Find the station at exactly these coordinates, creating it if absent.
    pub async fn get_or_create_station(
        &self,
        latitude: f64,
        longitude: f64,
        name: &str,
        station_type: &str,
    ) -> Result<WeatherStation, Error> {
        let existing = sqlx::query_as::<_, WeatherStation>(
            "SELECT id, name, station_type, latitude, longitude
             FROM weather_stations WHERE latitude = ? AND longitude = ?",
        )
        .bind(latitude)
        .bind(longitude)
        .fetch_optional(&self.pool)
        .await?;
        if let Some(station) = existing {
            return Ok(station);
        }

        let station = sqlx::query_as::<_, WeatherStation>(
            "INSERT INTO weather_stations (name, station_type, latitude, longitude)
             VALUES (?, ?, ?, ?)
             RETURNING id, name, station_type, latitude, longitude",
        )
        .bind(name)
        .bind(station_type)
        .bind(latitude)
        .bind(longitude)
        .fetch_one(&self.pool)
        .await?;
        Ok(station)
    }

    /// Look up a station by id, rejecting assets of any other type.
    pub async fn station_by_id(&self, id: i64) -> Result<WeatherStation, Error> {
        let station = sqlx::query_as::<_, WeatherStation>(
            "SELECT id, name, station_type, latitude, longitude
             FROM weather_stations WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::UnknownAssetId(id))?;

        if station.station_type != crate::WEATHER_STATION_TYPE {
            return Err(Error::NotAWeatherStation {
                id,
                actual: station.station_type,
            });
        }
        Ok(station)
    }

    pub async fn sensor_at_station(
        &self,
        station_id: i64,
        name: &str,
    ) -> Result<Option<WeatherSensor>, Error> {
        let sensor = sqlx::query_as::<_, WeatherSensor>(
            "SELECT id, station_id, name, unit, event_resolution_mins, timezone,
                    daily_seasonality, weekly_seasonality, yearly_seasonality
             FROM weather_sensors WHERE station_id = ? AND name = ?",
        )
        .bind(station_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(sensor)
    }

    pub async fn create_sensor(
        &self,
        station_id: i64,
        spec: &SensorSpec,
        timezone: &str,
    ) -> Result<WeatherSensor, Error> {
        let sensor = sqlx::query_as::<_, WeatherSensor>(
            "INSERT INTO weather_sensors
                 (station_id, name, unit, event_resolution_mins, timezone,
                  daily_seasonality, weekly_seasonality, yearly_seasonality)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING id, station_id, name, unit, event_resolution_mins, timezone,
                       daily_seasonality, weekly_seasonality, yearly_seasonality",
        )
        .bind(station_id)
        .bind(spec.kind.name())
        .bind(spec.unit)
        .bind(spec.event_resolution_mins)
        .bind(timezone)
        .bind(spec.seasonality.daily)
        .bind(spec.seasonality.weekly)
        .bind(spec.seasonality.yearly)
        .fetch_one(&self.pool)
        .await?;
        Ok(sensor)
    }

    /// The sensor with this name whose station is closest to the given
    /// coordinates. Distance is compared in squared degrees, which is fine
    /// for ranking nearby stations.
    pub async fn find_closest_sensor(
        &self,
        name: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<LocatedSensor>, Error> {
        let sensor = sqlx::query_as::<_, LocatedSensor>(
            "SELECT s.id, s.station_id, s.name, s.unit, s.event_resolution_mins,
                    w.latitude AS station_latitude, w.longitude AS station_longitude
             FROM weather_sensors s
             JOIN weather_stations w ON w.id = s.station_id
             WHERE s.name = ?
             ORDER BY (w.latitude - ?) * (w.latitude - ?)
                    + (w.longitude - ?) * (w.longitude - ?)
             LIMIT 1",
        )
        .bind(name)
        .bind(latitude)
        .bind(latitude)
        .bind(longitude)
        .bind(longitude)
        .fetch_optional(&self.pool)
        .await?;
        Ok(sensor)
    }

    pub async fn get_or_create_source(
        &self,
        name: &str,
        source_type: &str,
    ) -> Result<DataSource, Error> {
        let existing = sqlx::query_as::<_, DataSource>(
            "SELECT id, name, source_type FROM data_sources WHERE name = ? AND source_type = ?",
        )
        .bind(name)
        .bind(source_type)
        .fetch_optional(&self.pool)
        .await?;
        if let Some(source) = existing {
            return Ok(source);
        }

        let source = sqlx::query_as::<_, DataSource>(
            "INSERT INTO data_sources (name, source_type) VALUES (?, ?)
             RETURNING id, name, source_type",
        )
        .bind(name)
        .bind(source_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(source)
    }

    /// Record a batch of beliefs in one transaction. Tuples already present
    /// are left untouched and counted as skipped.
    pub async fn save_beliefs(&self, beliefs: &[NewBelief]) -> Result<SaveReport, Error> {
        let mut report = SaveReport::default();
        let mut tx = self.pool.begin().await?;
        for belief in beliefs {
            let result = sqlx::query(
                "INSERT INTO timed_beliefs
                     (sensor_id, event_start, belief_horizon_secs, event_value, source_id)
                 VALUES (?, ?, ?, ?, ?)
                 ON CONFLICT DO NOTHING",
            )
            .bind(belief.sensor_id)
            .bind(belief.event_start.unix_timestamp())
            .bind(belief.belief_horizon_secs)
            .bind(belief.event_value)
            .bind(belief.source_id)
            .execute(&mut *tx)
            .await?;
            if result.rows_affected() == 1 {
                report.inserted += 1;
            } else {
                report.skipped += 1;
            }
        }
        tx.commit().await?;
        Ok(report)
    }

    pub async fn beliefs_for_sensor(&self, sensor_id: i64) -> Result<Vec<TimedBelief>, Error> {
        let beliefs = sqlx::query_as::<_, TimedBelief>(
            "SELECT sensor_id, event_start, belief_horizon_secs, event_value, source_id
             FROM timed_beliefs WHERE sensor_id = ?
             ORDER BY event_start, belief_horizon_secs, source_id",
        )
        .bind(sensor_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(beliefs)
    }
}
