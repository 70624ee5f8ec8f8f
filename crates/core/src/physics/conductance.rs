//! Canopy and aerodynamic conductance
//!
//! # References
//! - Allen, R.G. et al. (1998). FAO Irrigation and Drainage Paper 56, Eq. 4
//! - Kelliher, F.M. et al. (1995). "Maximum conductances for evaporation from
//!   global vegetation types". Agricultural and Forest Meteorology, 73, 1-16

use crate::physics::constants::{divide, share, PhysicalConstants, HR2S, J_PER_MJ};
use crate::physics::layers::{CanopyState, LayerStack};

/// Conductance floor for a canopy layer (m/s)
const MIN_CANOPY_CONDUCTANCE: f64 = 0.0001;

/// Conductance floor for the whole canopy (m/s)
const MIN_AERODYNAMIC_CONDUCTANCE: f64 = 0.001;

/// Canopy conductance of one crop in one layer (m/s).
///
/// Hyperbolic light response integrated over the layer's leaf area.
///
/// # Arguments
/// * `gsmax` - Maximum stomatal conductance of the crop (m/s)
/// * `r50` - Radiation at which stomatal conductance halves (W/m²)
/// * `lai_fraction` - Crop green LAI over the layer total LAI (0-1)
/// * `layer_k` - Layer extinction coefficient
/// * `layer_lai` - Total LAI of the layer
/// * `radiation` - Radiation at the top of the layer (W/m²)
pub fn canopy_conductance(
    gsmax: f64,
    r50: f64,
    lai_fraction: f64,
    layer_k: f64,
    layer_lai: f64,
    radiation: f64,
) -> f64 {
    let numerator = radiation + r50;
    let denominator = radiation * (-layer_k * layer_lai).exp() + r50;
    let hyperbolic = divide(numerator, denominator, 0.0).max(1.0);
    (divide(gsmax * lai_fraction, layer_k, 0.0) * hyperbolic.ln()).max(MIN_CANOPY_CONDUCTANCE)
}

/// Aerodynamic conductance of the whole canopy from the FAO log wind profile (m/s).
///
/// Measurements are assumed to be taken `reference_height` above the canopy
/// top. A zero canopy height gives the floor value.
///
/// # Arguments
/// * `wind` - Wind speed at the reference height (m/s)
/// * `reference_height` - Instrument height above the canopy (m)
/// * `canopy_height` - Height of the canopy top (m)
pub fn aerodynamic_conductance(
    wind: f64,
    reference_height: f64,
    canopy_height: f64,
    constants: &PhysicalConstants,
) -> f64 {
    let displacement = 0.666 * canopy_height;
    let z_measure = canopy_height + reference_height;
    let z0_momentum = 0.123 * canopy_height;
    let z0_heat = 0.1 * z0_momentum;

    let k = constants.von_karman;
    let (momentum, heat) = if z0_momentum != 0.0 && z0_heat != 0.0 {
        (
            divide(k, divide(z_measure - displacement, z0_momentum, 0.0).ln(), 0.0),
            divide(k, divide(z_measure - displacement, z0_heat, 0.0).ln(), 0.0),
        )
    } else {
        (0.0, 0.0)
    };
    (wind * momentum * heat).max(MIN_AERODYNAMIC_CONDUCTANCE)
}

/// Fill `gc` of every canopy, sweeping layers from the top down.
///
/// The radiation flux at the top of each layer is the daily shortwave still
/// unintercepted, spread over the evaporative day and reduced by the zone
/// albedo.
pub fn calculate_canopy_conductance(
    radn: f64,
    albedo: f64,
    day_length_evap: f64,
    stack: &LayerStack,
    canopies: &mut [CanopyState],
) {
    let mut rin = radn;
    for i in (0..stack.num_layers()).rev() {
        let flux = rin * J_PER_MJ / (day_length_evap * HR2S) * (1.0 - albedo);
        let mut intercepted = 0.0;
        for canopy in canopies.iter_mut() {
            canopy.gc[i] = canopy_conductance(
                canopy.descriptor.gsmax,
                canopy.descriptor.r50,
                canopy.fgreen[i],
                stack.layer_ktot[i],
                stack.lai_tot_sum[i],
                flux,
            );
            intercepted += canopy.rs[i];
        }
        rin -= intercepted;
    }
}

/// Fill `ga` of every canopy by sharing the zone's aerodynamic conductance
/// in proportion to intercepted shortwave.
pub fn calculate_aerodynamic_conductance(
    wind: f64,
    reference_height: f64,
    sum_rs: f64,
    stack: &LayerStack,
    canopies: &mut [CanopyState],
    constants: &PhysicalConstants,
) {
    let total = aerodynamic_conductance(wind, reference_height, stack.total_height(), constants);
    for canopy in canopies.iter_mut() {
        for (ga, &rs) in canopy.ga.iter_mut().zip(&canopy.rs) {
            *ga = total * share(rs, sum_rs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_canopy_conductance_floor_in_darkness() {
        assert_eq!(
            canopy_conductance(0.01, 200.0, 1.0, 0.5, 2.0, 0.0),
            MIN_CANOPY_CONDUCTANCE
        );
        assert_eq!(
            canopy_conductance(0.01, 200.0, 1.0, 0.0, 2.0, 500.0),
            MIN_CANOPY_CONDUCTANCE
        );
    }

    #[test]
    fn test_canopy_conductance_increases_with_light() {
        let low = canopy_conductance(0.01, 200.0, 1.0, 0.5, 3.0, 100.0);
        let high = canopy_conductance(0.01, 200.0, 1.0, 0.5, 3.0, 800.0);
        assert!(high > low);
        let expected = 0.01 / 0.5 * ((800.0 + 200.0) / (800.0 * (-1.5_f64).exp() + 200.0)).ln();
        assert_relative_eq!(high, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_aerodynamic_conductance_bare_ground_floor() {
        let c = PhysicalConstants::default();
        assert_eq!(aerodynamic_conductance(3.0, 2.0, 0.0, &c), MIN_AERODYNAMIC_CONDUCTANCE);
    }

    #[test]
    fn test_aerodynamic_conductance_fao() {
        let c = PhysicalConstants::default();
        let h: f64 = 0.12;
        let d = 0.666 * h;
        let z = h + 2.0;
        let z0m = 0.123 * h;
        let expected = 2.0 * 0.41 / ((z - d) / z0m).ln() * 0.41 / ((z - d) / (0.1 * z0m)).ln();
        assert_relative_eq!(aerodynamic_conductance(2.0, 2.0, h, &c), expected, epsilon = 1e-12);
        assert!(aerodynamic_conductance(4.0, 2.0, h, &c) > expected);
    }
}
