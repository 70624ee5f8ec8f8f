//! Rainfall interception by the canopy

use crate::config::InterceptionCoefficients;
use crate::physics::constants::share;
use crate::physics::layers::CanopyState;

/// Largest fraction of rainfall the canopy may hold
const MAX_INTERCEPTED_FRACTION: f64 = 0.99;

/// Rain held on the canopy (mm): `a·rain^b + c·LAI + d`, bounded to
/// `[0, 0.99·rain]`.
///
/// # Arguments
/// * `coefficients` - Interception coefficients
/// * `rain` - Daily rainfall (mm)
/// * `lai_total` - Total LAI of all canopies in the zone
pub fn rainfall_interception(
    coefficients: &InterceptionCoefficients,
    rain: f64,
    lai_total: f64,
) -> f64 {
    let InterceptionCoefficients { a, b, c, d } = *coefficients;
    let raw = a * rain.powf(b) + c * lai_total + d;
    raw.min(MAX_INTERCEPTED_FRACTION * rain).max(0.0)
}

/// Rain reaching the soil surface (mm)
#[inline]
pub fn potential_infiltration(rain: f64, interception: f64) -> f64 {
    (rain - interception).max(0.0)
}

/// Compute the zone's intercepted rain and share it among canopy layers by
/// green LAI.
///
/// # Returns
/// Total intercepted rain (mm)
pub fn calculate_interception(
    coefficients: &InterceptionCoefficients,
    rain: f64,
    canopies: &mut [CanopyState],
) -> f64 {
    let sum_lai: f64 = canopies.iter().flat_map(|c| c.lai.iter()).sum();
    let sum_lai_tot: f64 = canopies.iter().flat_map(|c| c.lai_tot.iter()).sum();
    let total = rainfall_interception(coefficients, rain, sum_lai_tot);
    for canopy in canopies.iter_mut() {
        for (held, &lai) in canopy.interception.iter_mut().zip(&canopy.lai) {
            *held = share(lai, sum_lai) * total;
        }
    }
    total
}
