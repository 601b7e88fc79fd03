pub mod forecasts;
pub mod register;
