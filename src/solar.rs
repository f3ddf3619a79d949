//! Solar position from the NOAA solar calculator equations
//!
//! Free functions with no state so the geometry is testable in isolation.
//! Accuracy is on the order of the underlying low-order series, which is
//! sufficient for luminous efficacy modeling; no atmospheric refraction
//! correction is applied.

use std::f64::consts::{FRAC_PI_2, PI};

/// Solar elevation angle in radians for a local wall-clock time.
///
/// `day_of_year` is 1-based (1 to 365/366). The result is clamped at 0 so
/// the sun is never reported below the geometric horizon.
#[must_use]
pub fn elevation_angle(
    latitude: f64,
    longitude: f64,
    hour: u32,
    minute: u32,
    utc_offset: f64,
    day_of_year: u32,
) -> f64 {
    let hour = f64::from(hour);
    let minute = f64::from(minute);

    // Fractional year in radians
    let frac_year = 2.0 * PI / 365.0 * (f64::from(day_of_year) - 1.0 + (hour - 12.0) / 24.0);

    // Equation of time in minutes
    let eqtime = 229.18
        * (0.000075 + 0.001868 * frac_year.cos()
            - 0.032077 * frac_year.sin()
            - 0.014615 * (2.0 * frac_year).cos()
            - 0.040849 * (2.0 * frac_year).sin());

    // Declination angle in radians
    let decl = 0.006918 - 0.399912 * frac_year.cos() + 0.070257 * frac_year.sin()
        - 0.006758 * (2.0 * frac_year).cos()
        + 0.000907 * (2.0 * frac_year).sin()
        - 0.002697 * (3.0 * frac_year).cos()
        + 0.00148 * (3.0 * frac_year).sin();

    // Time offset in minutes
    let time_offset = eqtime + 4.0 * longitude - 60.0 * utc_offset;

    // True solar time in minutes
    let tst = hour * 60.0 + minute + time_offset;

    // Solar hour angle in degrees
    let hour_angle = tst / 4.0 - 180.0;

    let lat_rad = latitude.to_radians();
    let elevation = (lat_rad.sin() * decl.sin()
        + lat_rad.cos() * decl.cos() * hour_angle.to_radians().cos())
    .asin();

    elevation.max(0.0)
}

/// Zenith angle in radians for a given elevation angle
#[must_use]
pub fn zenith_angle(elevation: f64) -> f64 {
    FRAC_PI_2 - elevation
}

/// Relative optical air mass, approximated as the secant of the zenith
/// angle. Valid for the daylight range the illuminance model accepts.
#[must_use]
pub fn relative_air_mass(zenith: f64) -> f64 {
    1.0 / zenith.cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_summer_solstice_noon_is_high() {
        // Boulder-area coordinates at local solar noon near the solstice
        let elevation = elevation_angle(40.0, -105.0, 12, 0, -7.0, 172);
        assert!(elevation > 1.2, "expected > 1.2 rad, got {elevation}");
        assert!(elevation < FRAC_PI_2);
    }

    #[rstest]
    #[case(40.0, -105.0, 0, -7.0, 172)] // midnight in summer
    #[case(40.0, -105.0, 23, -7.0, 355)] // winter night
    #[case(-33.9, 151.2, 2, 10.0, 80)] // Sydney, pre-dawn
    fn test_sun_below_horizon_clamps_to_zero(
        #[case] latitude: f64,
        #[case] longitude: f64,
        #[case] hour: u32,
        #[case] utc_offset: f64,
        #[case] day_of_year: u32,
    ) {
        let elevation = elevation_angle(latitude, longitude, hour, 0, utc_offset, day_of_year);
        assert_eq!(elevation, 0.0);
    }

    #[test]
    fn test_winter_noon_lower_than_summer_noon() {
        let summer = elevation_angle(40.0, -105.0, 12, 0, -7.0, 172);
        let winter = elevation_angle(40.0, -105.0, 12, 0, -7.0, 355);
        assert!(winter > 0.0);
        assert!(summer > winter + 0.5);
    }

    #[test]
    fn test_zenith_is_complement_of_elevation() {
        let elevation = 0.3;
        assert!((zenith_angle(elevation) - (FRAC_PI_2 - 0.3)).abs() < 1e-12);
    }

    #[test]
    fn test_air_mass_is_one_at_zenith() {
        assert!((relative_air_mass(0.0) - 1.0).abs() < 1e-12);
        // Oblique sun path lengths grow quickly
        assert!(relative_air_mass(1.0) > 1.8);
    }
}
