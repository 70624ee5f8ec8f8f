//! Physical constants table and shared numeric helpers
//!
//! Every physics function takes the table by reference so a configuration can
//! override individual values without touching module state.

use serde::{Deserialize, Serialize};

/// Seconds per hour
pub const HR2S: f64 = 3600.0;

/// Joules per megajoule
pub const J_PER_MJ: f64 = 1_000_000.0;

/// Denominators closer to zero than this are treated as zero by [`divide`]
pub const DIVIDE_TOLERANCE: f64 = 1e-5;

/// Physical and empirical constants used by the energy balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalConstants {
    /// Long wave emissivity of leaves
    pub canopy_emissivity: f64,
    /// Long wave emissivity of bare soil
    pub soil_emissivity: f64,
    /// Offset from °C to K
    pub abs_temp: f64,
    /// Cloud term of the net long wave cloud correction
    pub c_cloud: f64,
    /// Stefan-Boltzmann constant (W/m²/K⁴)
    pub stef_boltz: f64,
    pub von_karman: f64,
    /// Teten saturated vapour pressure coefficients
    pub svp_a: f64,
    pub svp_b: f64,
    pub svp_c: f64,
    /// Molecular weight of water (kg/mol)
    pub mwh2o: f64,
    /// Molecular weight of dry air (kg/mol)
    pub mwair: f64,
    /// Specific heat of air (J/kg/K)
    pub cp: f64,
    /// Density of water (kg/m³)
    pub rho_w: f64,
    /// Universal gas constant (J/mol/K)
    pub r_gas: f64,
    /// Weight of the maximum-temperature VPD in the daily VPD
    pub svp_fract: f64,
    /// Maximum temperatures bounding the normal equilibrium evaporation factor (°C)
    pub min_crit_temp: f64,
    pub max_crit_temp: f64,
    /// Albedo of a full green cover, used by soil evaporation
    pub max_albedo: f64,
    /// Sun elevation defining the light day length (degrees)
    pub sun_set_angle: f64,
    /// Sun elevation above which net radiation is positive (degrees)
    pub sun_angle_net_positive_radiation: f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            canopy_emissivity: 0.96,
            soil_emissivity: 0.96,
            abs_temp: 273.16,
            c_cloud: 0.1,
            stef_boltz: 5.67e-8,
            von_karman: 0.41,
            svp_a: 6.106,
            svp_b: 17.27,
            svp_c: 237.3,
            mwh2o: 0.018016,
            mwair: 0.02897,
            cp: 1010.0,
            rho_w: 998.0,
            r_gas: 8.3143,
            svp_fract: 0.66,
            min_crit_temp: 5.0,
            max_crit_temp: 35.0,
            max_albedo: 0.23,
            sun_set_angle: 0.0,
            sun_angle_net_positive_radiation: 15.0,
        }
    }
}

impl PhysicalConstants {
    /// Ratio of the molecular weights of water and dry air
    #[inline]
    pub fn molef(&self) -> f64 {
        self.mwh2o / self.mwair
    }
}

/// Divide `numerator` by `denominator`, returning `err_val` when the
/// denominator is within [`DIVIDE_TOLERANCE`] of zero.
#[inline]
pub fn divide(numerator: f64, denominator: f64, err_val: f64) -> f64 {
    if denominator.abs() < DIVIDE_TOLERANCE {
        err_val
    } else {
        numerator / denominator
    }
}

/// Fraction of `whole` held by `part`, zero when `whole` is not positive.
///
/// Used where the shares must sum back to the whole exactly, however small
/// it is, so no tolerance applies.
#[inline]
pub fn share(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_keeps_tiny_wholes() {
        assert_eq!(share(1.0, 0.0), 0.0);
        assert_eq!(share(1.0, -2.0), 0.0);
        assert_eq!(share(1e-7, 4e-7), 0.25);
        assert_eq!(divide(1e-7, 4e-7, 0.0), 0.0);
    }

    #[test]
    fn test_divide_guards_small_denominators() {
        assert_eq!(divide(1.0, 0.0, -1.0), -1.0);
        assert_eq!(divide(1.0, 1e-6, 0.0), 0.0);
        assert_eq!(divide(1.0, 4.0, 0.0), 0.25);
        assert_eq!(divide(1.0, -2.0, 0.0), -0.5);
    }

    #[test]
    fn test_molecular_weight_ratio() {
        let c = PhysicalConstants::default();
        assert!((c.molef() - 0.6219).abs() < 1e-3);
    }
}
