//! Sky illuminance from irradiance per Perez et al. (1990), "Modeling
//! Daylight Availability and Irradiance Components from Direct and Global
//! Irradiance".
//!
//! The model classifies the sky into eight discrete clearness categories
//! and applies per-category luminous efficacy coefficients to derive
//! global, direct, diffuse and zenith illuminance from the measured
//! irradiance components. Uses the actual rather than apparent zenith.

use crate::{EpwGenError, Result};
use std::f64::consts::{FRAC_PI_2, PI};

/// Constant kappa next to Equation 1 of the paper
const KAPPA: f64 = 1.041;

/// Normalization constant for the sky brightness index (Equation 2)
const EXTRATERRESTRIAL_IRRADIANCE: f64 = 1360.0;

/// Zenith angles at or beyond this limit count as sun-below-horizon
const LOW_SUN_LIMIT: f64 = FRAC_PI_2 - 0.5 * PI / 180.0;

/// The four illuminance components, truncated to integers the way the
/// reference outputs are produced (toward zero, not rounded)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Illuminance {
    /// Global horizontal illuminance in lux
    pub global: i32,
    /// Direct normal illuminance in lux, floored at 0
    pub direct: i32,
    /// Diffuse horizontal illuminance in lux
    pub diffuse: i32,
    /// Zenith luminance in cd/m2
    pub zenith: i32,
}

/// Discrete sky clearness categories, Table 1 of the paper.
///
/// Boundaries are closed-open intervals over the clearness index:
/// [1, 1.065), [1.065, 1.23), [1.23, 1.5), [1.5, 1.95), [1.95, 2.8),
/// [2.8, 4.5), [4.5, 6.2) and [6.2, inf). Category 1 is fully overcast,
/// category 8 a very clear sky.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkyClearness {
    Category1,
    Category2,
    Category3,
    Category4,
    Category5,
    Category6,
    Category7,
    Category8,
}

impl SkyClearness {
    /// Classify a clearness index. Values below 1 (including NaN from
    /// degenerate irradiance ratios) are physically inconsistent and are
    /// rejected rather than mapped to a default category.
    pub fn from_clearness_index(epsilon: f64) -> Result<Self> {
        if epsilon < 1.0 || epsilon.is_nan() {
            return Err(EpwGenError::model_precondition(format!(
                "sky clearness index {epsilon} is below the model minimum of 1"
            )));
        }
        Ok(if epsilon < 1.065 {
            Self::Category1
        } else if epsilon < 1.23 {
            Self::Category2
        } else if epsilon < 1.5 {
            Self::Category3
        } else if epsilon < 1.95 {
            Self::Category4
        } else if epsilon < 2.8 {
            Self::Category5
        } else if epsilon < 4.5 {
            Self::Category6
        } else if epsilon < 6.2 {
            Self::Category7
        } else {
            Self::Category8
        })
    }

    /// Row index into the coefficient tables
    #[must_use]
    fn index(self) -> usize {
        match self {
            Self::Category1 => 0,
            Self::Category2 => 1,
            Self::Category3 => 2,
            Self::Category4 => 3,
            Self::Category5 => 4,
            Self::Category6 => 5,
            Self::Category7 => 6,
            Self::Category8 => 7,
        }
    }
}

// Per-category (a, b, c, d) coefficients, Table 4 of the paper.

/// Global luminous efficacy (Equation 6)
const GLOBAL_LUMINOUS_EFFICACY: [(f64, f64, f64, f64); 8] = [
    (96.63, -0.47, 11.50, -9.16),
    (107.54, 0.79, 1.79, -1.19),
    (98.73, 0.70, 4.40, -6.95),
    (92.72, 0.56, 8.36, -8.31),
    (86.73, 0.98, 7.10, -10.94),
    (88.34, 1.39, 6.06, -7.60),
    (78.63, 1.47, 4.93, -11.37),
    (99.65, 1.86, -4.46, -3.15),
];

/// Direct luminous efficacy (Equation 8)
const DIRECT_LUMINOUS_EFFICACY: [(f64, f64, f64, f64); 8] = [
    (57.20, -4.55, -2.98, 117.12),
    (98.99, -3.46, -1.21, 12.38),
    (109.83, -4.90, -1.71, -8.81),
    (110.34, -5.84, -1.99, -4.56),
    (106.36, -3.97, -1.75, -6.16),
    (107.19, -1.25, -1.51, -26.73),
    (105.75, 0.77, -1.26, -34.44),
    (101.18, 1.58, -1.10, -8.29),
];

/// Diffuse luminous efficacy (Equation 7)
const DIFFUSE_LUMINOUS_EFFICACY: [(f64, f64, f64, f64); 8] = [
    (97.24, -0.46, 12.00, -8.91),
    (107.22, 1.15, 0.59, -3.95),
    (104.97, 2.96, -5.52, -8.77),
    (102.39, 5.59, -13.95, -13.90),
    (100.71, 5.94, -22.75, -23.74),
    (106.42, 3.83, -36.15, -28.83),
    (141.88, 1.90, -53.24, -14.03),
    (152.23, 0.35, -45.27, -7.98),
];

/// Zenith luminance (Equation 9)
const ZENITH_LUMINANCE: [(f64, f64, f64, f64); 8] = [
    (40.86, 26.77, -29.59, -45.75),
    (26.58, 14.73, 58.46, -21.25),
    (19.34, 2.28, 100.00, 0.25),
    (13.25, -1.39, 124.79, 15.66),
    (14.47, -5.09, 160.09, 9.13),
    (19.76, -3.88, 154.61, -19.21),
    (28.39, -9.67, 151.58, -69.39),
    (42.91, -19.62, 130.80, -164.08),
];

/// Derive the illuminance quartet from irradiance components.
///
/// `zenith` is the solar zenith angle in radians and `rel_airmass` the
/// relative optical air mass. Returns all zeros when the sun is below the
/// horizon (zenith within half a degree of 90) or there is no global
/// irradiance. A clearness index below 1 is a precondition violation.
pub fn illuminance(
    ghi: f64,
    dhi: f64,
    dni: f64,
    zenith: f64,
    rel_airmass: f64,
    dew_point: f64,
) -> Result<Illuminance> {
    if zenith >= LOW_SUN_LIMIT || ghi <= 0.0 {
        return Ok(Illuminance::default());
    }

    if dhi <= 0.0 {
        return Err(EpwGenError::model_precondition(format!(
            "diffuse irradiance must be positive when the sun is up (dhi={dhi}, dni={dni})"
        )));
    }

    let zenith_cubed = zenith.powi(3);
    let epsilon =
        ((dhi + dni) / dhi + KAPPA * zenith_cubed) / (1.0 + KAPPA * zenith_cubed);
    let category = SkyClearness::from_clearness_index(epsilon)?;

    // Sky brightness (Equation 2) and precipitable water proxy (Equation 3)
    let delta = dhi * rel_airmass / EXTRATERRESTRIAL_IRRADIANCE;
    let water = (0.08 * dew_point - 0.075).exp();

    let (a, b, c, d) = GLOBAL_LUMINOUS_EFFICACY[category.index()];
    let global = ghi * (a + b * water + c * zenith.cos() + d * delta.ln());

    let (a, b, c, d) = DIRECT_LUMINOUS_EFFICACY[category.index()];
    let direct = (dni * (a + b * water + c * (5.73 * zenith - 5.0).exp() + d * delta)).max(0.0);

    let (a, b, c, d) = DIFFUSE_LUMINOUS_EFFICACY[category.index()];
    let diffuse = dhi * (a + b * water + c * zenith.cos() + d * delta.ln());

    let (a, b, c, d) = ZENITH_LUMINANCE[category.index()];
    let zenith_lum = dhi * (a + b * zenith.cos() + c * (-3.0 * zenith).exp() + d * delta);

    Ok(Illuminance {
        global: global as i32,
        direct: direct as i32,
        diffuse: diffuse as i32,
        zenith: zenith_lum as i32,
    })
}
