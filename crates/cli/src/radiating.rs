//! Estimating solar irradiance from cloud cover.
//!
//! The weather provider has no irradiance field, so we compute it:
//! 1. clear-sky Global Horizontal Irradiance (GHI) from the solar position
//!    (NREL SPA) and the Ineichen-Perez clear-sky model, and
//! 2. an empirical cloud attenuation of that clear-sky value.
//!
//! References
//! ----------
//! Perez, R., Moore, K., Wilcox, S., Renne, D., Zelenka, A., 2007.
//! Forecasting solar radiation - preliminary evaluation of an approach
//! based upon the national forecast database. Solar Energy 81, 809-812.

use std::f64::consts::PI;

use solar_positioning::{spa, time::JulianDate, RefractionCorrection};
use time::{OffsetDateTime, UtcOffset};

/// Solar constant in W/m²
const SOLAR_CONSTANT: f64 = 1361.0;

/// Linke turbidity factor; 3.0 is a typical continental atmosphere
const LINKE_TURBIDITY: f64 = 3.0;

/// Rough ΔT (TT - UT1) in seconds for the current era; sub-minute accuracy
/// is irrelevant at our angular resolution
const DELTA_T: f64 = 69.0;

#[derive(thiserror::Error, Debug)]
pub enum RadiationError {
    #[error("cloud coverage should lie in the interval [0, 1], got {0}")]
    CloudCoverageOutOfRange(f64),
    #[error("failed to compute solar position: {0}")]
    SolarPosition(String),
}

/// Compute the irradiance received at a location at a specific instant,
/// given a cloud coverage ratio in [0, 1].
pub fn compute_irradiance(
    latitude: f64,
    longitude: f64,
    at: OffsetDateTime,
    cloud_coverage: f64,
) -> Result<f64, RadiationError> {
    let ghi_clear = clear_sky_ghi(latitude, longitude, at)?;
    ghi_clear_to_ghi(ghi_clear, cloud_coverage)
}

/// Attenuate clear-sky GHI for cloud coverage (Perez et al. 2007).
pub fn ghi_clear_to_ghi(ghi_clear: f64, cloud_coverage: f64) -> Result<f64, RadiationError> {
    if !(0.0..=1.0).contains(&cloud_coverage) {
        return Err(RadiationError::CloudCoverageOutOfRange(cloud_coverage));
    }
    Ok((1.0 - 0.87 * cloud_coverage.powf(1.9)) * ghi_clear)
}

/// Clear-sky GHI via Ineichen-Perez at sea level with a fixed Linke
/// turbidity. Returns 0 when the sun is at or below the horizon.
pub fn clear_sky_ghi(
    latitude: f64,
    longitude: f64,
    at: OffsetDateTime,
) -> Result<f64, RadiationError> {
    let utc = at.to_offset(UtcOffset::UTC);
    let julian = JulianDate::from_utc(
        utc.year(),
        utc.month() as u32,
        u32::from(utc.day()),
        u32::from(utc.hour()),
        u32::from(utc.minute()),
        f64::from(utc.second()),
        DELTA_T,
    )
    .map_err(|e| RadiationError::SolarPosition(e.to_string()))?;

    let position = spa::solar_position_from_julian(
        julian,
        latitude,
        longitude,
        0.0,
        Some(RefractionCorrection::standard()),
    )
    .map_err(|e| RadiationError::SolarPosition(e.to_string()))?;

    let zenith = position.zenith_angle();
    if zenith >= 90.0 {
        return Ok(0.0);
    }
    let cos_zenith = zenith.to_radians().cos();
    let elevation = 90.0 - zenith;

    // Kasten & Young (1989) relative airmass, from apparent elevation
    let airmass = 1.0 / (cos_zenith + 0.50572 * (elevation + 6.07995).powf(-1.6364));

    // Eccentricity-corrected extraterrestrial irradiance (Spencer 1971)
    let day_angle = 2.0 * PI * f64::from(utc.ordinal() - 1) / 365.0;
    let extraterrestrial = SOLAR_CONSTANT
        * (1.00011
            + 0.034221 * day_angle.cos()
            + 0.00128 * day_angle.sin()
            + 0.000719 * (2.0 * day_angle).cos()
            + 0.000077 * (2.0 * day_angle).sin());

    // Ineichen-Perez with sea-level altitude coefficients
    let cg1 = 0.868;
    let cg2 = 0.0387;
    let ghi = cg1
        * extraterrestrial
        * cos_zenith
        * (-cg2 * airmass * (1.0 + (LINKE_TURBIDITY - 1.0))).exp()
        * (0.01 * airmass.powf(1.8)).exp();

    Ok(ghi.max(0.0))
}
