//! Model configuration
//!
//! All fields have defaults so a TOML file only needs to name the values it
//! changes:
//!
//! ```
//! use micromet_core::MicroClimateConfig;
//!
//! let config = MicroClimateConfig::from_toml_str(
//!     r#"
//!     reference_height = 3.0
//!
//!     [interception]
//!     a = 0.2
//!
//!     [constants]
//!     von_karman = 0.4
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.reference_height, 3.0);
//! assert_eq!(config.interception.b, 1.0);
//! assert_eq!(config.constants.von_karman, 0.4);
//! ```

use crate::error::{MicroClimateError, Result};
use crate::physics::constants::PhysicalConstants;
use serde::{Deserialize, Serialize};

/// Coefficients of `a·rain^b + c·LAI + d` rainfall interception (mm)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptionCoefficients {
    /// Multiplier on rainfall (mm/mm)
    pub a: f64,
    /// Power on rainfall
    pub b: f64,
    /// Multiplier on total LAI (mm)
    pub c: f64,
    /// Constant (mm)
    pub d: f64,
}

impl Default for InterceptionCoefficients {
    fn default() -> Self {
        Self {
            a: 0.0,
            b: 1.0,
            c: 0.0,
            d: 0.0,
        }
    }
}

/// Parameters of the micro-climate model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicroClimateConfig {
    pub interception: InterceptionCoefficients,
    /// Fraction of radiation reaching the soil surface that heats the soil (0-1)
    pub soil_heat_flux_fraction: f64,
    /// Fraction of intercepted rainfall that evaporates at night (0-1)
    pub night_interception_fraction: f64,
    /// Height of the weather instruments above the canopy (m)
    pub reference_height: f64,
    /// Canopy tops closer than this to an existing layer boundary do not open a new layer (m)
    pub minimum_height_diff_for_new_layer: f64,
    pub constants: PhysicalConstants,
}

impl Default for MicroClimateConfig {
    fn default() -> Self {
        Self {
            interception: InterceptionCoefficients::default(),
            soil_heat_flux_fraction: 0.4,
            night_interception_fraction: 0.5,
            reference_height: 2.0,
            minimum_height_diff_for_new_layer: 0.0,
            constants: PhysicalConstants::default(),
        }
    }
}

impl MicroClimateConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: MicroClimateConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if !(1.0..=10.0).contains(&self.reference_height) {
            return Err(MicroClimateError::ReferenceHeightOutOfRange(
                self.reference_height,
            ));
        }
        for (name, value) in [
            ("soil_heat_flux_fraction", self.soil_heat_flux_fraction),
            ("night_interception_fraction", self.night_interception_fraction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(MicroClimateError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        let min_diff = self.minimum_height_diff_for_new_layer;
        if min_diff.is_nan() || min_diff < 0.0 {
            return Err(MicroClimateError::InvalidConfig(format!(
                "minimum_height_diff_for_new_layer must be non-negative, got {min_diff}"
            )));
        }
        let i = &self.interception;
        if [i.a, i.b, i.c, i.d].iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(MicroClimateError::InvalidConfig(format!(
                "interception coefficients must be finite and non-negative, got {i:?}"
            )));
        }
        Ok(())
    }
}
