//! The fixed mapping of semantic sensors to OpenWeatherMap response fields.
//!
//! Sensor names must be unique per weather station, and every sensor here
//! reports hourly values. "irradiance" is special: the provider has no such
//! field, so it maps to the cloud cover field and the ingestion pipeline
//! derives the actual value (see `radiating`).

use std::fmt;

/// Event resolution shared by all supported sensors, in minutes.
pub const EVENT_RESOLUTION_MINS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Temperature,
    WindSpeed,
    CloudCover,
    Irradiance,
}

impl SensorKind {
    /// The sensor name as stored in the database and shown to users.
    pub fn name(self) -> &'static str {
        match self {
            SensorKind::Temperature => "temperature",
            SensorKind::WindSpeed => "wind speed",
            SensorKind::CloudCover => "cloud cover",
            SensorKind::Irradiance => "irradiance",
        }
    }

    pub fn from_name(name: &str) -> Option<SensorKind> {
        let name = name.trim().to_lowercase();
        MAPPING
            .iter()
            .find(|spec| spec.kind.name() == name)
            .map(|spec| spec.kind)
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Seasonality hints picked up by downstream forecasting models; the
/// ingestion pipeline stores them but does not interpret them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seasonality {
    pub daily: bool,
    pub weekly: bool,
    pub yearly: bool,
}

const WEATHER_SEASONALITY: Seasonality = Seasonality {
    daily: true,
    weekly: false,
    yearly: true,
};

#[derive(Debug, Clone, Copy)]
pub struct SensorSpec {
    pub kind: SensorKind,
    /// Field name in the provider's hourly response entries.
    pub provider_field: &'static str,
    pub unit: &'static str,
    pub event_resolution_mins: i64,
    pub seasonality: Seasonality,
}

pub const MAPPING: [SensorSpec; 4] = [
    SensorSpec {
        kind: SensorKind::Temperature,
        provider_field: "temp",
        unit: "°C",
        event_resolution_mins: EVENT_RESOLUTION_MINS,
        seasonality: WEATHER_SEASONALITY,
    },
    SensorSpec {
        kind: SensorKind::WindSpeed,
        provider_field: "wind_speed",
        unit: "m/s",
        event_resolution_mins: EVENT_RESOLUTION_MINS,
        seasonality: WEATHER_SEASONALITY,
    },
    SensorSpec {
        kind: SensorKind::CloudCover,
        provider_field: "clouds",
        unit: "%",
        event_resolution_mins: EVENT_RESOLUTION_MINS,
        seasonality: WEATHER_SEASONALITY,
    },
    SensorSpec {
        kind: SensorKind::Irradiance,
        provider_field: "clouds",
        unit: "W/m²",
        event_resolution_mins: EVENT_RESOLUTION_MINS,
        seasonality: WEATHER_SEASONALITY,
    },
];

pub fn spec_for(kind: SensorKind) -> &'static SensorSpec {
    match kind {
        SensorKind::Temperature => &MAPPING[0],
        SensorKind::WindSpeed => &MAPPING[1],
        SensorKind::CloudCover => &MAPPING[2],
        SensorKind::Irradiance => &MAPPING[3],
    }
}

pub fn spec_by_name(name: &str) -> Option<&'static SensorSpec> {
    SensorKind::from_name(name).map(spec_for)
}

/// Comma-separated list of supported sensor names, for help and error texts.
pub fn supported_sensors_str() -> String {
    MAPPING
        .iter()
        .map(|spec| spec.kind.name())
        .collect::<Vec<_>>()
        .join(", ")
}
