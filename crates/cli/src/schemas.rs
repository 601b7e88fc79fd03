//! Input validation for the registration command.
//!
//! Validation collects every problem before reporting, so users fix their
//! invocation in one go instead of replaying it per field.

use std::borrow::Cow;

use validator::{Validate, ValidationError, ValidationErrors};

use crate::sensor_specs::{self, SensorKind};

#[derive(Debug, Clone, Validate)]
pub struct WeatherSensorSchema {
    #[validate(custom = "validate_supported_name")]
    pub name: String,
    #[validate(custom = "validate_timezone")]
    pub timezone: String,
    #[validate(range(
        min = -90.0,
        max = 90.0,
        message = "latitude must lie within [-90, 90]"
    ))]
    pub latitude: Option<f64>,
    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "longitude must lie within [-180, 180]"
    ))]
    pub longitude: Option<f64>,
}

fn validate_supported_name(name: &str) -> Result<(), ValidationError> {
    if SensorKind::from_name(name).is_some() {
        return Ok(());
    }
    let mut error = ValidationError::new("unsupported_sensor");
    error.message = Some(Cow::Owned(format!(
        "unsupported sensor name {:?}, pick one of: {}",
        name,
        sensor_specs::supported_sensors_str()
    )));
    Err(error)
}

fn validate_timezone(timezone: &str) -> Result<(), ValidationError> {
    if timezone.parse::<chrono_tz::Tz>().is_ok() {
        return Ok(());
    }
    let mut error = ValidationError::new("unknown_timezone");
    error.message = Some(Cow::Owned(format!(
        "{timezone:?} is not a known IANA timezone"
    )));
    Err(error)
}

/// Flatten validation errors into one message per offending field.
pub fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                let detail = error
                    .message
                    .as_deref()
                    .unwrap_or_else(|| error.code.as_ref());
                format!("{field}: {detail}")
            })
        })
        .collect();
    messages.sort();
    messages
}
