//! Transformation of a raw hourly series into the annual EPW record table
//!
//! Consumes the fetched reanalysis window plus location metadata and
//! produces the fixed-schema table: timestamps shifted to local time and
//! filtered to the target year, gaps interpolated, units converted, solar
//! position and the illuminance quartet computed per row, and the two
//! soil-temperature channels aggregated by month for the header.

use crate::generator::{hours_in_year, is_leap_year};
use crate::illuminance;
use crate::models::record::{
    MISSING_CEILING, MISSING_DAYS_SINCE_SNOW, MISSING_IRRADIANCE, MISSING_OPTICAL_DEPTH,
    MISSING_PRECIP_QUANTITY, MISSING_VISIBILITY, MISSING_WEATHER_CODE, QUALITY_FLAGS,
};
use crate::models::series::MAX_INTERPOLATION_GAP;
use crate::models::{EpwFile, EpwHeader, EpwRecord, HourlySeries, Location};
use crate::solar;
use crate::{EpwGenError, Result};
use chrono::{Datelike, Duration, NaiveDateTime, Timelike};
use tracing::{debug, info, instrument};

// Column names as returned by the reanalysis API (unit-suffixed)
pub const COL_TEMPERATURE: &str = "temperature (degC)";
pub const COL_DEW_POINT: &str = "dewpoint_temperature (degC)";
pub const COL_GHI: &str = "surface_solar_radiation (W/m^2)";
pub const COL_THERMAL_RADIATION: &str = "surface_thermal_radiation (W/m^2)";
pub const COL_DHI: &str = "surface_diffuse_solar_radiation (W/m^2)";
pub const COL_DNI: &str = "direct_normal_solar_radiation (W/m^2)";
pub const COL_RELATIVE_HUMIDITY: &str = "relative_humidity (0-1)";
pub const COL_WIND_SPEED: &str = "wind_speed (m/s)";
pub const COL_WIND_DIRECTION: &str = "wind_direction (deg)";
pub const COL_PRESSURE: &str = "surface_pressure (Pa)";
pub const COL_CLOUD_COVER: &str = "total_cloud_cover (0-1)";
pub const COL_PRECIPITATION: &str = "total_precipitation (mm of water equivalent)";
pub const COL_SOIL_SHALLOW: &str = "soil_temperature_level_3 (degC)";
pub const COL_SOIL_DEEP: &str = "soil_temperature_level_4 (degC)";
pub const COL_ALBEDO: &str = "forecast_albedo (0-1)";
pub const COL_CLOUD_BASE: &str = "cloud_base_height (m)";
pub const COL_RAIN_WATER: &str = "total_column_rain_water (mm of water equivalent)";
pub const COL_SNOW_DEPTH: &str = "snow_depth (mm of water equivalent)";
pub const COL_SNOW_DENSITY: &str = "snow_density (kg/m^3)";
pub const COL_SNOWFALL: &str = "snowfall (mm of water equivalent)";

/// Transform a fetched UTC series into the annual EPW table for `year`.
///
/// The series must cover at least the full local year; the fetch window's
/// one-day margin on each side absorbs the timezone shift.
#[instrument(skip(series, location))]
pub fn transform(series: &HourlySeries, location: &Location, year: i32) -> Result<EpwFile> {
    let mut local = series.clone();
    local.shift_hours(location.utc_offset);

    let mut yearly = local.filter_year(year);
    let expected = hours_in_year(year);
    if yearly.len() != expected {
        return Err(EpwGenError::format(format!(
            "expected {} local hours for {}, fetched window yields {}",
            expected,
            year,
            yearly.len()
        )));
    }
    for window in yearly.timestamps().windows(2) {
        if window[1] - window[0] != Duration::hours(1) {
            return Err(EpwGenError::format(format!(
                "hourly index is not continuous between {} and {}",
                window[0], window[1]
            )));
        }
    }

    // A missing ceiling is a sentinel, not a gap to interpolate
    yearly.fill_missing(COL_CLOUD_BASE, MISSING_CEILING as f64);
    yearly.interpolate_gaps(MAX_INTERPOLATION_GAP);
    debug!("Interpolated gaps up to {} hours", MAX_INTERPOLATION_GAP);

    let temperature = yearly.require_column(COL_TEMPERATURE)?;
    let dew_point = yearly.require_column(COL_DEW_POINT)?;
    let ghi = yearly.require_column(COL_GHI)?;
    let thermal = yearly.require_column(COL_THERMAL_RADIATION)?;
    let dhi = yearly.require_column(COL_DHI)?;
    let dni = yearly.require_column(COL_DNI)?;
    let relative_humidity = yearly.require_column(COL_RELATIVE_HUMIDITY)?;
    let wind_speed = yearly.require_column(COL_WIND_SPEED)?;
    let wind_direction = yearly.require_column(COL_WIND_DIRECTION)?;
    let pressure = yearly.require_column(COL_PRESSURE)?;
    let cloud_cover = yearly.require_column(COL_CLOUD_COVER)?;
    let precipitation = yearly.require_column(COL_PRECIPITATION)?;
    let albedo = yearly.require_column(COL_ALBEDO)?;
    let ceiling = yearly.require_column(COL_CLOUD_BASE)?;
    let rain_water = yearly.require_column(COL_RAIN_WATER)?;
    let snow_depth_we = yearly.require_column(COL_SNOW_DEPTH)?;
    let snow_density = yearly.require_column(COL_SNOW_DENSITY)?;
    let snowfall = yearly.require_column(COL_SNOWFALL)?;

    let mut records = Vec::with_capacity(expected);
    for (i, timestamp) in yearly.timestamps().iter().enumerate() {
        let elevation = solar::elevation_angle(
            location.latitude,
            location.longitude,
            timestamp.hour(),
            timestamp.minute(),
            location.utc_offset,
            timestamp.ordinal(),
        );
        let zenith = solar::zenith_angle(elevation);
        let air_mass = solar::relative_air_mass(zenith);

        let light = illuminance::illuminance(
            ghi[i],
            dhi[i],
            dni[i],
            zenith,
            air_mass,
            dew_point[i],
        )
        .map_err(|e| at_timestamp(e, *timestamp))?;

        // Snow depth arrives as water equivalent; zero water equivalent is
        // zero physical depth no matter what density the model reports
        let snow_depth = if snow_depth_we[i] > 0.0 && snow_density[i] > 0.0 {
            snow_depth_we[i] / snow_density[i] * 100.0
        } else {
            0.0
        };

        records.push(EpwRecord {
            year: timestamp.year(),
            month: timestamp.month(),
            day: timestamp.day(),
            hour: timestamp.hour() + 1,
            minute: timestamp.minute(),
            flags: QUALITY_FLAGS.to_string(),
            dry_bulb_temperature: temperature[i],
            dew_point_temperature: dew_point[i],
            relative_humidity: (relative_humidity[i] * 100.0) as i64,
            atmospheric_pressure: pressure[i] as i64,
            extraterrestrial_ghi: MISSING_IRRADIANCE,
            extraterrestrial_dni: MISSING_IRRADIANCE,
            horizontal_infrared_radiation: thermal[i] as i64,
            global_horizontal_irradiance: ghi[i] as i64,
            direct_normal_irradiance: dni[i] as i64,
            diffuse_horizontal_irradiance: dhi[i] as i64,
            global_illuminance: light.global,
            direct_illuminance: light.direct,
            diffuse_illuminance: light.diffuse,
            zenith_illuminance: light.zenith,
            wind_direction: wind_direction[i] as i64,
            wind_speed: wind_speed[i],
            total_sky_cover: (cloud_cover[i] * 10.0) as i64,
            opaque_sky_cover: (cloud_cover[i] * 10.0) as i64,
            visibility: MISSING_VISIBILITY,
            ceiling_height: ceiling[i] as i64,
            present_weather_observation: 0,
            present_weather_code: MISSING_WEATHER_CODE,
            precipitable_water: rain_water[i],
            aerosol_optical_depth: MISSING_OPTICAL_DEPTH,
            snow_depth,
            days_since_snowfall: MISSING_DAYS_SINCE_SNOW,
            albedo: albedo[i],
            liquid_precipitation_depth: (precipitation[i] - snowfall[i]).max(0.0),
            liquid_precipitation_quantity: MISSING_PRECIP_QUANTITY,
        });
    }

    let soil_monthly_shallow = yearly.monthly_means(COL_SOIL_SHALLOW)?;
    let soil_monthly_deep = yearly.monthly_means(COL_SOIL_DEEP)?;
    let first_weekday = yearly.timestamps()[0].format("%A").to_string();

    info!("Transformed {} hourly records for {}", records.len(), year);

    Ok(EpwFile {
        header: EpwHeader {
            location: location.clone(),
            leap_year: is_leap_year(year),
            soil_monthly_shallow,
            soil_monthly_deep,
            first_weekday,
        },
        records,
    })
}

/// Attach the offending local timestamp to a per-row model error
fn at_timestamp(err: EpwGenError, timestamp: NaiveDateTime) -> EpwGenError {
    match err {
        EpwGenError::ModelPrecondition { message } => EpwGenError::ModelPrecondition {
            message: format!("{timestamp}: {message}"),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn test_location() -> Location {
        Location::new(
            40.0,
            -105.0,
            "Boulder".to_string(),
            "CO".to_string(),
            "USA".to_string(),
            1655.0,
            -7.0,
        )
    }

    /// Synthetic UTC window spanning the target year with a day of margin
    /// on both sides, constant weather everywhere.
    fn synthetic_window(year: i32) -> HourlySeries {
        let start = NaiveDate::from_ymd_opt(year - 1, 12, 30)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let end = NaiveDate::from_ymd_opt(year + 1, 1, 2)
            .unwrap()
            .and_hms_opt(23, 0, 0)
            .unwrap();
        let mut timestamps = Vec::new();
        let mut ts = start;
        while ts <= end {
            timestamps.push(ts);
            ts += Duration::hours(1);
        }
        let n = timestamps.len();

        let constant = |v: f64| vec![Some(v); n];
        let columns = BTreeMap::from([
            (COL_TEMPERATURE.to_string(), constant(20.0)),
            (COL_DEW_POINT.to_string(), constant(10.0)),
            (COL_GHI.to_string(), constant(100.0)),
            (COL_THERMAL_RADIATION.to_string(), constant(300.0)),
            (COL_DHI.to_string(), constant(50.0)),
            (COL_DNI.to_string(), constant(100.0)),
            (COL_RELATIVE_HUMIDITY.to_string(), constant(0.45)),
            (COL_WIND_SPEED.to_string(), constant(3.2)),
            (COL_WIND_DIRECTION.to_string(), constant(180.0)),
            (COL_PRESSURE.to_string(), constant(85000.0)),
            (COL_CLOUD_COVER.to_string(), constant(0.8)),
            (COL_PRECIPITATION.to_string(), constant(0.1)),
            (COL_SOIL_SHALLOW.to_string(), constant(5.0)),
            (COL_SOIL_DEEP.to_string(), constant(6.5)),
            (COL_ALBEDO.to_string(), constant(0.2)),
            (COL_CLOUD_BASE.to_string(), vec![None; n]),
            (COL_RAIN_WATER.to_string(), constant(10.0)),
            (COL_SNOW_DEPTH.to_string(), constant(0.0)),
            (COL_SNOW_DENSITY.to_string(), constant(100.0)),
            (COL_SNOWFALL.to_string(), constant(0.3)),
        ]);
        HourlySeries::new(timestamps, columns).unwrap()
    }

    #[test]
    fn test_full_year_record_count_and_calendar() {
        let series = synthetic_window(2023);
        let epw = transform(&series, &test_location(), 2023).unwrap();

        assert_eq!(epw.records.len(), 8760);

        let first = &epw.records[0];
        assert_eq!(
            (first.year, first.month, first.day, first.hour, first.minute),
            (2023, 1, 1, 1, 0)
        );
        let last = epw.records.last().unwrap();
        assert_eq!((last.month, last.day, last.hour), (12, 31, 24));

        assert!(!epw.header.leap_year);
        assert_eq!(epw.header.first_weekday, "Sunday"); // Jan 1, 2023
    }

    #[test]
    fn test_leap_year_record_count() {
        let series = synthetic_window(2024);
        let epw = transform(&series, &test_location(), 2024).unwrap();
        assert_eq!(epw.records.len(), 8784);
        assert!(epw.header.leap_year);
        assert_eq!(epw.header.first_weekday, "Monday"); // Jan 1, 2024
    }

    #[test]
    fn test_unit_conversions_and_sentinels() {
        let series = synthetic_window(2023);
        let epw = transform(&series, &test_location(), 2023).unwrap();
        let record = &epw.records[0];

        assert_eq!(record.relative_humidity, 45);
        assert_eq!(record.atmospheric_pressure, 85000);
        assert_eq!(record.total_sky_cover, 8);
        assert_eq!(record.opaque_sky_cover, 8);
        assert_eq!(record.ceiling_height, MISSING_CEILING);
        assert_eq!(record.extraterrestrial_ghi, MISSING_IRRADIANCE);
        assert_eq!(record.present_weather_code, MISSING_WEATHER_CODE);
        // 0.1 mm precipitation minus 0.3 mm snowfall clamps to zero
        assert_eq!(record.liquid_precipitation_depth, 0.0);
        // zero water equivalent means zero physical snow depth
        assert_eq!(record.snow_depth, 0.0);
    }

    #[test]
    fn test_night_hours_have_zero_illuminance() {
        let series = synthetic_window(2023);
        let epw = transform(&series, &test_location(), 2023).unwrap();

        // Local 01:00 on Jan 1 is record index 1 (hour field 2)
        let night = &epw.records[1];
        assert_eq!(night.global_illuminance, 0);
        assert_eq!(night.direct_illuminance, 0);
        assert_eq!(night.diffuse_illuminance, 0);
        assert_eq!(night.zenith_illuminance, 0);

        // Around local noon in June the quartet is positive
        let noon_june = epw
            .records
            .iter()
            .find(|r| r.month == 6 && r.day == 21 && r.hour == 13)
            .unwrap();
        assert!(noon_june.global_illuminance > 0);
        assert!(noon_june.diffuse_illuminance > 0);
    }

    #[test]
    fn test_soil_means_reach_header() {
        let series = synthetic_window(2023);
        let epw = transform(&series, &test_location(), 2023).unwrap();
        for month0 in 0..12 {
            assert!((epw.header.soil_monthly_shallow[month0] - 5.0).abs() < 1e-9);
            assert!((epw.header.soil_monthly_deep[month0] - 6.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_short_window_is_rejected() {
        let series = synthetic_window(2023).filter_year(2023);
        // Filtering to UTC-2023 then shifting by -7 h loses the first
        // local hours of the year
        let result = transform(&series, &test_location(), 2023);
        assert!(matches!(result, Err(EpwGenError::Format { .. })));
    }

    #[test]
    fn test_long_gap_in_required_field_fails() {
        let series = synthetic_window(2023);
        let n = series.len();
        let timestamps = series.timestamps().to_vec();
        let mut columns = BTreeMap::new();
        for name in [
            COL_TEMPERATURE,
            COL_DEW_POINT,
            COL_GHI,
            COL_THERMAL_RADIATION,
            COL_DHI,
            COL_DNI,
            COL_RELATIVE_HUMIDITY,
            COL_WIND_SPEED,
            COL_WIND_DIRECTION,
            COL_PRESSURE,
            COL_CLOUD_COVER,
            COL_PRECIPITATION,
            COL_SOIL_SHALLOW,
            COL_SOIL_DEEP,
            COL_ALBEDO,
            COL_CLOUD_BASE,
            COL_RAIN_WATER,
            COL_SNOW_DEPTH,
            COL_SNOW_DENSITY,
            COL_SNOWFALL,
        ] {
            columns.insert(
                name.to_string(),
                series.column(name).unwrap().to_vec(),
            );
        }
        // Punch a 10-hour hole into the temperature channel mid-year
        let hole = columns.get_mut(COL_TEMPERATURE).unwrap();
        for slot in hole.iter_mut().skip(n / 2).take(10) {
            *slot = None;
        }
        let series = HourlySeries::new(timestamps, columns).unwrap();

        let result = transform(&series, &test_location(), 2023);
        match result {
            Err(EpwGenError::DataCompleteness { field, .. }) => {
                assert_eq!(field, COL_TEMPERATURE);
            }
            other => panic!("expected DataCompleteness, got {other:?}"),
        }
    }
}
