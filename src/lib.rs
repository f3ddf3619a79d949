//! `epwgen` - EnergyPlus weather file generation from ERA5 reanalysis data
//!
//! This library turns raw hourly reanalysis data for a geographic location
//! into a standardized annual EPW weather file: solar geometry per hour,
//! Perez-model sky illuminance, unit reconciliation and gap filling, and
//! the fixed-format EPW serialization with monthly header aggregates.

pub mod api;
pub mod config;
pub mod error;
pub mod generator;
pub mod illuminance;
pub mod models;
pub mod solar;
pub mod transform;
pub mod writer;

// Re-export core types for public API
pub use api::{FetchedWindow, OikolabClient, WeatherSource};
pub use config::EpwGenConfig;
pub use error::EpwGenError;
pub use generator::{EpwGenerator, EpwRequest, hours_in_year, is_leap_year};
pub use illuminance::{Illuminance, SkyClearness};
pub use models::{EpwFile, EpwHeader, EpwRecord, HourlySeries, Location};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, EpwGenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
