//! Top-down shortwave sweep through a layered zone

use crate::error::{MicroClimateError, Result};
use crate::physics::constants::share;
use crate::physics::layers::{CanopyState, LayerStack};
use tracing::trace;

/// Distribute `incoming` shortwave (MJ/m²) through the layers of a zone.
///
/// Each layer, from the top down, intercepts
/// `Rin·(1 − exp(−layer_ktot·lai_tot_sum))`; the intercepted amount is split
/// among canopies by `ftot·ktot / layer_ktot` and the rest passes to the layer
/// below. Writes `rs` of every canopy.
///
/// # Returns
/// The shortwave reaching the soil surface
///
/// # Errors
/// [`MicroClimateError::NonFiniteRadiation`] if any term is NaN or infinite
pub fn distribute_layered(
    zone: &str,
    incoming: f64,
    stack: &LayerStack,
    canopies: &mut [CanopyState],
) -> Result<f64> {
    let non_finite = |layer: usize| MicroClimateError::NonFiniteRadiation {
        zone: zone.to_string(),
        layer,
    };

    let n = stack.num_layers();
    if !incoming.is_finite() {
        return Err(non_finite(n));
    }

    let mut rin = incoming;
    for i in (0..n).rev() {
        let layer_ktot = stack.layer_ktot[i];
        let rint = rin * (1.0 - (-layer_ktot * stack.lai_tot_sum[i]).exp());
        if !rint.is_finite() {
            return Err(non_finite(i));
        }
        for canopy in canopies.iter_mut() {
            canopy.rs[i] = rint * share(canopy.ftot[i] * canopy.ktot, layer_ktot);
        }
        rin -= rint;
        trace!(
            "Zone '{}' layer {}: intercepted {:.4} MJ/m2, passed down {:.4} MJ/m2",
            zone,
            i,
            rint,
            rin
        );
    }
    Ok(rin)
}
