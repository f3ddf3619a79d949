//! End-to-end EPW generation: fetch, transform, serialize
//!
//! Ties the weather source, the record transformation and the file writer
//! together. Any failure aborts the whole run before the output file is
//! finalized; the core never retries on its own.

use crate::api::WeatherSource;
use crate::models::{EpwFile, Location};
use crate::transform;
use crate::writer;
use crate::{EpwGenError, Result};
use std::path::Path;
use std::time::Instant;
use tracing::{info, instrument};

/// Gregorian leap year rule
#[must_use]
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Hours in the target calendar year
#[must_use]
pub fn hours_in_year(year: i32) -> usize {
    if is_leap_year(year) { 8784 } else { 8760 }
}

/// What to generate: the site coordinates, display names for the file
/// header, and the target calendar year.
#[derive(Debug, Clone)]
pub struct EpwRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub year: i32,
    pub city: String,
    pub state: String,
    pub country: String,
}

impl EpwRequest {
    /// Check coordinate ranges before any network traffic
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
}

/// EPW generation pipeline over any [`WeatherSource`]
pub struct EpwGenerator<S: WeatherSource> {
    source: S,
}

impl<S: WeatherSource> EpwGenerator<S> {
    /// Create a generator backed by the given weather source
    #[must_use]
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Generate an EPW file for the request and write it to `output`.
    /// Returns the assembled table for further inspection.
    #[instrument(skip(self, request), fields(year = request.year))]
    pub fn generate(&self, request: &EpwRequest, output: &Path) -> Result<EpwFile> {
        request.validate()?;
        let start = Instant::now();

        let window = self
            .source
            .fetch_epw_window(request.latitude, request.longitude, request.year)?;

        let location = Location::new(
            request.latitude,
            request.longitude,
            request.city.clone(),
            request.state.clone(),
            request.country.clone(),
            window.elevation,
            window.utc_offset,
        );
        location.validate()?;

        let epw = transform::transform(&window.series, &location, request.year)?;
        writer::write_epw(output, &epw)?;

        info!(
            "Generated {} ({} records) in {:.3}s",
            output.display(),
            epw.records.len(),
            start.elapsed().as_secs_f64()
        );
        Ok(epw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(2023, false)]
    #[case(2024, true)]
    #[case(2000, true)]
    #[case(1900, false)]
    #[case(2100, false)]
    #[case(2400, true)]
    fn test_is_leap_year(#[case] year: i32, #[case] expected: bool) {
        assert_eq!(is_leap_year(year), expected);
    }

    #[test]
    fn test_hours_in_year() {
        assert_eq!(hours_in_year(2023), 8760);
        assert_eq!(hours_in_year(2024), 8784);
    }

    #[test]
    fn test_request_validation() {
        let mut request = EpwRequest {
            latitude: 40.0,
            longitude: -105.0,
            year: 2023,
            city: "Boulder".to_string(),
            state: "CO".to_string(),
            country: "USA".to_string(),
        };
        assert!(request.validate().is_ok());

        request.latitude = 95.0;
        assert!(request.validate().is_err());
    }
}
