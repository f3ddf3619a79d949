//! Location model for geographic coordinates and site metadata

use crate::{EpwGenError, Result};
use serde::{Deserialize, Serialize};

/// Geographic location with the site metadata carried into the EPW header
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// City display name
    pub city: String,
    /// State or region display name
    pub state: String,
    /// Country display name
    pub country: String,
    /// Site elevation in meters
    pub elevation: f64,
    /// UTC offset in hours (fractional offsets allowed)
    pub utc_offset: f64,
}

impl Location {
    /// Create a new location
    #[must_use]
    pub fn new(
        latitude: f64,
        longitude: f64,
        city: String,
        state: String,
        country: String,
        elevation: f64,
        utc_offset: f64,
    ) -> Self {
        Self {
            latitude,
            longitude,
            city,
            state,
            country,
            elevation,
            utc_offset,
        }
    }

    /// Check that the coordinates are within their physical ranges
    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(EpwGenError::validation(format!(
                "latitude {} is outside -90..90",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(EpwGenError::validation(format!(
                "longitude {} is outside -180..180",
                self.longitude
            )));
        }
        Ok(())
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}
