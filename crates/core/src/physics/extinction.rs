//! Beer-Lambert light extinction coefficients
//!
//! A canopy's extinction coefficient is recovered from its reported cover and
//! leaf area, `cover = 1 − exp(−K·LAI)`. Covers at or near one have no finite
//! solution and are rejected.

use crate::error::{MicroClimateError, Result};
use crate::physics::constants::divide;
use crate::physics::layers::{CanopyState, LayerStack};

/// Covers at or above this value make the extinction coefficient undefined
pub const MAX_COVER: f64 = 0.999_999_999;

/// Extinction coefficient from cover and leaf area index
///
/// # Arguments
/// * `cover` - Ground cover fraction (0-1, below [`MAX_COVER`])
/// * `lai` - Leaf area index matching the cover
///
/// # Returns
/// K = −ln(1 − cover) / LAI, or 0 when LAI is negligible
#[inline]
pub fn extinction_coefficient(cover: f64, lai: f64) -> f64 {
    divide(-(1.0 - cover).ln(), lai, 0.0)
}

/// Reject a cover with no finite extinction coefficient.
///
/// Applied to total cover as well as green cover, since `ktot` is derived
/// from `cover_total` the same way `k` is from `cover_green`.
fn check_cover(name: &str, cover: f64) -> Result<()> {
    if cover >= MAX_COVER || cover.is_nan() {
        return Err(MicroClimateError::UnrealisticCover {
            canopy: name.to_string(),
            cover,
        });
    }
    Ok(())
}

/// Set `k` and `ktot` of every canopy, then the layer total extinction
/// `layer_ktot[i] = Σ ftot·ktot`.
///
/// Leaf area must already be distributed.
pub fn calculate_extinction(stack: &mut LayerStack, canopies: &mut [CanopyState]) -> Result<()> {
    for canopy in canopies.iter_mut() {
        let d = &canopy.descriptor;
        check_cover(&d.name, d.cover_green)?;
        check_cover(&d.name, d.cover_total)?;
        canopy.k = extinction_coefficient(d.cover_green, d.lai);
        canopy.ktot = extinction_coefficient(d.cover_total, d.lai_total);
    }

    for i in 0..stack.num_layers() {
        stack.layer_ktot[i] = canopies.iter().map(|c| c.ftot[i] * c.ktot).sum();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::CanopyDescriptor;
    use approx::assert_relative_eq;

    #[test]
    fn test_extinction_from_half_cover() {
        assert_relative_eq!(extinction_coefficient(0.5, 2.0), 0.346_574, epsilon = 1e-6);
        assert_eq!(extinction_coefficient(0.5, 0.0), 0.0);
    }

    #[test]
    fn test_full_cover_is_rejected() {
        let mut stack = LayerStack::default();
        let mut canopies = [CanopyState::new(
            CanopyDescriptor::new("lucerne", 500.0, 500.0)
                .with_lai(6.0, 6.0)
                .with_cover(0.999_999_999_9, 0.999_999_999_9),
        )];
        let err = calculate_extinction(&mut stack, &mut canopies).unwrap_err();
        assert!(matches!(err, MicroClimateError::UnrealisticCover { .. }));
    }

    #[test]
    fn test_total_cover_is_checked_too() {
        let mut stack = LayerStack::default();
        let mut canopies = [CanopyState::new(
            CanopyDescriptor::new("grass", 500.0, 500.0)
                .with_lai(2.0, 8.0)
                .with_cover(0.6, 1.0),
        )];
        assert!(calculate_extinction(&mut stack, &mut canopies).is_err());
    }

    #[test]
    fn test_layer_extinction_weights_by_fraction() {
        let mut stack = LayerStack::default();
        stack.rebuild(&[0.0, 1.0]);
        let mut a = CanopyState::new(
            CanopyDescriptor::new("a", 1000.0, 1000.0)
                .with_lai(1.0, 1.0)
                .with_cover(0.5, 0.5),
        );
        let mut b = CanopyState::new(
            CanopyDescriptor::new("b", 1000.0, 1000.0)
                .with_lai(1.0, 1.0)
                .with_cover(0.3, 0.3),
        );
        a.reset(a.descriptor.clone(), 1);
        b.reset(b.descriptor.clone(), 1);
        a.ftot[0] = 0.25;
        b.ftot[0] = 0.75;
        let mut canopies = [a, b];
        calculate_extinction(&mut stack, &mut canopies).unwrap();
        let expected = 0.25 * -(0.5_f64.ln()) + 0.75 * -(0.7_f64.ln());
        assert_relative_eq!(stack.layer_ktot[0], expected, epsilon = 1e-12);
    }
}
