//! The fixed-schema EPW record, header and file types
//!
//! EPW is a positional format: downstream energy simulators read fields by
//! column index, so the order emitted by [`EpwRecord::csv_row`] is a
//! compatibility contract and must never change.

use crate::models::Location;
use serde::{Deserialize, Serialize};

/// Data-quality flag string carried verbatim in every record
pub const QUALITY_FLAGS: &str = "?9?9?9?9E0?9?9?9?9*9?9?9?9?9?9?9?9?9?9*_*9*9*9?9?9";

/// Sentinel for missing extraterrestrial irradiance fields
pub const MISSING_IRRADIANCE: i64 = 9999;
/// Sentinel for the visibility field
pub const MISSING_VISIBILITY: i64 = 9999;
/// Sentinel for a missing ceiling (cloud base) height
pub const MISSING_CEILING: i64 = 77777;
/// Sentinel for the present weather code
pub const MISSING_WEATHER_CODE: i64 = 999_999_999;
/// Sentinel for the aerosol optical depth field
pub const MISSING_OPTICAL_DEPTH: i64 = 999;
/// Sentinel for days since last snowfall
pub const MISSING_DAYS_SINCE_SNOW: i64 = 99;
/// Sentinel for the liquid precipitation quantity field
pub const MISSING_PRECIP_QUANTITY: i64 = 999;

/// One hour of the annual EPW table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpwRecord {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Local hour numbered 1-24 (hour 24 covers 23:00-24:00)
    pub hour: u32,
    pub minute: u32,
    /// Data source and uncertainty flags
    pub flags: String,
    /// Dry bulb temperature in degC
    pub dry_bulb_temperature: f64,
    /// Dew point temperature in degC
    pub dew_point_temperature: f64,
    /// Relative humidity in percent
    pub relative_humidity: i64,
    /// Station pressure in Pa
    pub atmospheric_pressure: i64,
    /// Extraterrestrial horizontal radiation (not provided)
    pub extraterrestrial_ghi: i64,
    /// Extraterrestrial direct normal radiation (not provided)
    pub extraterrestrial_dni: i64,
    /// Horizontal infrared radiation intensity in W/m2
    pub horizontal_infrared_radiation: i64,
    /// Global horizontal irradiance in W/m2
    pub global_horizontal_irradiance: i64,
    /// Direct normal irradiance in W/m2
    pub direct_normal_irradiance: i64,
    /// Diffuse horizontal irradiance in W/m2
    pub diffuse_horizontal_irradiance: i64,
    /// Global horizontal illuminance in lux
    pub global_illuminance: i32,
    /// Direct normal illuminance in lux
    pub direct_illuminance: i32,
    /// Diffuse horizontal illuminance in lux
    pub diffuse_illuminance: i32,
    /// Zenith luminance in cd/m2
    pub zenith_illuminance: i32,
    /// Wind direction in degrees
    pub wind_direction: i64,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Total sky cover in tenths
    pub total_sky_cover: i64,
    /// Opaque sky cover in tenths
    pub opaque_sky_cover: i64,
    /// Visibility (not provided)
    pub visibility: i64,
    /// Ceiling height in m, or the missing sentinel
    pub ceiling_height: i64,
    /// Present weather observation indicator
    pub present_weather_observation: i64,
    /// Present weather code (not provided)
    pub present_weather_code: i64,
    /// Precipitable water in mm
    pub precipitable_water: f64,
    /// Aerosol optical depth (not provided)
    pub aerosol_optical_depth: i64,
    /// Physical snow depth in cm
    pub snow_depth: f64,
    /// Days since last snowfall (not provided)
    pub days_since_snowfall: i64,
    /// Surface albedo (0-1)
    pub albedo: f64,
    /// Liquid precipitation depth in mm
    pub liquid_precipitation_depth: f64,
    /// Liquid precipitation quantity (not provided)
    pub liquid_precipitation_quantity: i64,
}

impl EpwRecord {
    /// Number of comma-separated fields per body line
    pub const FIELD_COUNT: usize = 35;

    /// Emit the record as one EPW body line, fields in the fixed order
    #[must_use]
    pub fn csv_row(&self) -> String {
        [
            self.year.to_string(),
            self.month.to_string(),
            self.day.to_string(),
            self.hour.to_string(),
            self.minute.to_string(),
            self.flags.clone(),
            self.dry_bulb_temperature.to_string(),
            self.dew_point_temperature.to_string(),
            self.relative_humidity.to_string(),
            self.atmospheric_pressure.to_string(),
            self.extraterrestrial_ghi.to_string(),
            self.extraterrestrial_dni.to_string(),
            self.horizontal_infrared_radiation.to_string(),
            self.global_horizontal_irradiance.to_string(),
            self.direct_normal_irradiance.to_string(),
            self.diffuse_horizontal_irradiance.to_string(),
            self.global_illuminance.to_string(),
            self.direct_illuminance.to_string(),
            self.diffuse_illuminance.to_string(),
            self.zenith_illuminance.to_string(),
            self.wind_direction.to_string(),
            self.wind_speed.to_string(),
            self.total_sky_cover.to_string(),
            self.opaque_sky_cover.to_string(),
            self.visibility.to_string(),
            self.ceiling_height.to_string(),
            self.present_weather_observation.to_string(),
            self.present_weather_code.to_string(),
            self.precipitable_water.to_string(),
            self.aerosol_optical_depth.to_string(),
            self.snow_depth.to_string(),
            self.days_since_snowfall.to_string(),
            self.albedo.to_string(),
            self.liquid_precipitation_depth.to_string(),
            self.liquid_precipitation_quantity.to_string(),
        ]
        .join(",")
    }
}

/// Header metadata for an EPW file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpwHeader {
    /// Site location and metadata for the LOCATION line
    pub location: Location,
    /// Whether the target year is a leap year
    pub leap_year: bool,
    /// Monthly means of the shallow soil temperature channel, degC
    pub soil_monthly_shallow: [f64; 12],
    /// Monthly means of the deep soil temperature channel, degC
    pub soil_monthly_deep: [f64; 12],
    /// Weekday name of the first record, e.g. "Sunday"
    pub first_weekday: String,
}

/// A complete annual EPW table ready for serialization
#[derive(Debug, Clone)]
pub struct EpwFile {
    pub header: EpwHeader,
    pub records: Vec<EpwRecord>,
}
