//! Light interception in two-zone row plantings
//!
//! A tall row (a strip of crop, a line of trees, a vine hedge) and the short
//! row or alley beside it repeat across the field. Light falling on one period
//! of the pattern is split between the two zones with a black-body view-factor
//! approximation that blends a "homogeneous" canopy (leaf spread evenly over
//! both zones) with the canopy compressed into its real footprint.
//!
//! The view-factor formulas are empirical heuristics. They are kept exactly as
//! calibrated and are only checked through the requirement that all light
//! fractions add up to one.
//!
//! All fractions are relative to the radiation falling on both zones together.

use crate::error::{MicroClimateError, Result};
use crate::physics::constants::divide;

/// Largest allowed deviation of the summed light fractions from one
pub const ENERGY_BALANCE_TOLERANCE: f64 = 0.001;

/// View factor of a black-body block of the given depth over a gap of the
/// given width: `(√(d² + w²) − d) / w`.
///
/// A gap of zero width sees nothing.
#[inline]
pub fn black_body_view_factor(depth: f64, width: f64) -> f64 {
    if width == 0.0 {
        return 0.0;
    }
    (depth.hypot(width) - depth) / width
}

/// Row-scale summary of one zone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowZone {
    /// Height of the top of the zone's layer stack (m)
    pub height: f64,
    /// Width across the row (m)
    pub width: f64,
    /// Total LAI over the zone's own ground area
    pub lai: f64,
    /// Total-leaf extinction coefficient of the zone's first canopy, 0 if none
    pub ktot: f64,
}

/// Where the light falling on one row period ends up
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LightFractions {
    /// Intercepted by the tall zone's canopy
    pub tall_interception: f64,
    /// Reaching the soil of the tall zone
    pub tall_transmission: f64,
    /// Intercepted by the short zone's canopy
    pub short_interception: f64,
    /// Reaching the soil of the short zone
    pub short_transmission: f64,
}

impl LightFractions {
    pub fn sum(&self) -> f64 {
        self.tall_interception
            + self.tall_transmission
            + self.short_interception
            + self.short_transmission
    }
}

/// Incoming shortwave for each zone, per unit of that zone's own ground area
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneIncoming {
    pub tall: f64,
    pub short: f64,
}

/// Transmission to the bottom of a crown and to the bottom of the gap beside
/// it, for a crown occupying `f_crown` of the row and a gap occupying `f_gap`.
///
/// Returns `(crown, gap)` transmissions as fractions of the row radiation.
fn crown_and_gap_transmission(
    f_crown: f64,
    f_gap: f64,
    view_crown: f64,
    view_gap: f64,
    k: f64,
    lai_crown: f64,
    lai_homogeneous: f64,
) -> (f64, f64) {
    let compressed = (-k * lai_crown).exp();
    let homogeneous = (-k * lai_homogeneous).exp();
    let crown = f_crown * (view_crown * compressed + f_crown * (1.0 - view_crown) * homogeneous)
        + f_gap * f_crown * (1.0 - view_gap) * homogeneous;
    let gap = f_gap * (view_gap + f_gap * (1.0 - view_gap) * homogeneous)
        + f_crown * f_gap * ((1.0 - view_crown) * homogeneous);
    (crown, gap)
}

/// Geometry-specific light interception model
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowGeometry {
    /// Two adjacent strips of crop; the taller strip shades across the shorter
    /// one but neither overhangs the other
    StripCrop,
    /// A tree crown on a clear bole; the crown may overhang the alley but sits
    /// entirely above the alley crop
    TreeRow {
        /// Crown depth (m)
        crown_depth: f64,
        /// Crown width across the row (m)
        crown_width: f64,
    },
    /// A vine hedge whose crown may be narrower or wider than the vine zone
    VineRow {
        /// Hedge depth (m)
        crown_depth: f64,
        /// Hedge width across the row (m)
        crown_width: f64,
    },
}

impl RowGeometry {
    /// Model name used in log and error messages
    pub fn name(&self) -> &'static str {
        match self {
            RowGeometry::StripCrop => "strip crop",
            RowGeometry::TreeRow { .. } => "tree row",
            RowGeometry::VineRow { .. } => "vine row",
        }
    }

    /// Light fractions for a tall and a short zone
    pub fn light_fractions(&self, tall: &RowZone, short: &RowZone) -> LightFractions {
        match *self {
            RowGeometry::StripCrop => strip_crop(tall, short),
            RowGeometry::TreeRow {
                crown_depth,
                crown_width,
            } => tree_row(tall, short, crown_depth, crown_width),
            RowGeometry::VineRow {
                crown_depth,
                crown_width,
            } => vine_row(tall, short, crown_depth, crown_width),
        }
    }

    /// Check the energy balance and scale each zone's interception back to
    /// its own ground area.
    ///
    /// # Errors
    /// [`MicroClimateError::EnergyBalanceNotMaintained`] when the fractions
    /// miss one by more than [`ENERGY_BALANCE_TOLERANCE`] or are not finite
    pub fn partition(&self, radn: f64, tall: &RowZone, short: &RowZone) -> Result<ZoneIncoming> {
        let fractions = self.light_fractions(tall, short);
        let sum = fractions.sum();
        // False for a NaN sum
        let balanced = (1.0 - sum).abs() <= ENERGY_BALANCE_TOLERANCE;
        if !balanced {
            return Err(MicroClimateError::EnergyBalanceNotMaintained {
                model: self.name(),
                sum,
            });
        }
        let total_width = tall.width + short.width;
        let tall_share = tall.width / total_width;
        let short_share = short.width / total_width;
        Ok(ZoneIncoming {
            tall: radn * fractions.tall_interception / tall_share,
            short: radn * fractions.short_interception / short_share,
        })
    }
}

fn strip_crop(tall: &RowZone, short: &RowZone) -> LightFractions {
    let (ht, hs) = (tall.height, short.height);
    let (wt, ws) = (tall.width, short.width);
    let (kt, ks) = (tall.ktot, short.ktot);
    let ft = wt / (wt + ws);
    let fs = ws / (wt + ws);

    // Part of the tall strip above the top of the short strip
    let h_top = ht - hs;
    let lai_top = h_top / ht * tall.lai;
    let lai_bottom = tall.lai - lai_top;
    let lai_top_homogeneous = ft * lai_top;

    let view_tall = black_body_view_factor(h_top, wt);
    let view_short = black_body_view_factor(h_top, ws);
    let (tt, ts) = crown_and_gap_transmission(
        ft,
        fs,
        view_tall,
        view_short,
        kt,
        lai_top,
        lai_top_homogeneous,
    );

    let intercepted_top = 1.0 - tt - ts;
    let lower_transmission = (-kt * lai_bottom).exp();
    let short_transmission = (-ks * short.lai).exp();
    LightFractions {
        tall_interception: intercepted_top + tt * (1.0 - lower_transmission),
        tall_transmission: tt * lower_transmission,
        short_interception: ts * (1.0 - short_transmission),
        short_transmission: ts * short_transmission,
    }
}

fn tree_row(
    tree: &RowZone,
    alley: &RowZone,
    crown_depth: f64,
    crown_width: f64,
) -> LightFractions {
    let (wt, wa) = (tree.width, alley.width);
    let w = wt + wa;
    let cw = crown_width.min(w);
    // Crown overhang into the alley and the open alley between crowns
    let overlap = (cw - wt).min(wa);
    let open = wa - overlap;
    let ft = cw / w;
    let fs = open / w;

    // Unguarded: a crown of zero width is a configuration error caught by the balance check
    let view_crown = (crown_depth.hypot(cw) - crown_depth) / cw;
    let view_gap = black_body_view_factor(crown_depth, open);
    let (tt, ta) = crown_and_gap_transmission(
        ft,
        fs,
        view_crown,
        view_gap,
        tree.ktot,
        tree.lai,
        ft * tree.lai,
    );

    let alley_transmission = (-alley.ktot * alley.lai).exp();
    let under_overlap = tt * overlap / cw;
    LightFractions {
        tall_interception: 1.0 - tt - ta,
        tall_transmission: tt * wt / cw,
        short_interception: (under_overlap + ta) * (1.0 - alley_transmission),
        short_transmission: (under_overlap + ta) * alley_transmission,
    }
}

fn vine_row(
    vine: &RowZone,
    alley: &RowZone,
    crown_depth: f64,
    crown_width: f64,
) -> LightFractions {
    let (wv, wa) = (vine.width, alley.width);
    let w = wv + wa;
    let cw = crown_width.max(0.0).min(w);
    let gap = w - cw;
    let fv = cw / w;
    let fg = gap / w;

    let view_crown = black_body_view_factor(crown_depth, cw);
    let view_gap = black_body_view_factor(crown_depth, gap);
    let (tv, tg) = crown_and_gap_transmission(
        fv,
        fg,
        view_crown,
        view_gap,
        vine.ktot,
        vine.lai,
        fv * vine.lai,
    );

    // Crown footprint over each zone, and the open strips left in each
    let under_vine = cw.min(wv);
    let under_alley = cw - under_vine;
    let open_vine = wv - under_vine;
    let open_alley = wa - under_alley;

    let vine_soil = tv * divide(under_vine, cw, 0.0) + tg * divide(open_vine, gap, 0.0);
    let alley_top = tv * divide(under_alley, cw, 0.0) + tg * divide(open_alley, gap, 0.0);
    let alley_transmission = (-alley.ktot * alley.lai).exp();
    LightFractions {
        tall_interception: 1.0 - tv - tg,
        tall_transmission: vine_soil,
        short_interception: alley_top * (1.0 - alley_transmission),
        short_transmission: alley_top * alley_transmission,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn zone(height: f64, width: f64, lai: f64, ktot: f64) -> RowZone {
        RowZone {
            height,
            width,
            lai,
            ktot,
        }
    }

    #[test]
    fn test_view_factor() {
        assert_eq!(black_body_view_factor(1.0, 0.0), 0.0);
        assert_eq!(black_body_view_factor(0.0, 2.0), 1.0);
        assert_relative_eq!(
            black_body_view_factor(3.0, 4.0),
            (5.0 - 3.0) / 4.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_strip_crop_balances() {
        let tall = zone(2.0, 3.0, 4.0, 0.5);
        let short = zone(0.5, 6.0, 2.0, 0.6);
        let f = RowGeometry::StripCrop.light_fractions(&tall, &short);
        assert_relative_eq!(f.sum(), 1.0, epsilon = ENERGY_BALANCE_TOLERANCE);
        assert!(f.tall_interception > 0.0 && f.short_interception > 0.0);
    }

    #[test]
    fn test_strip_crop_equal_heights_split_by_width() {
        // With no height difference each strip only sees its own sky
        let tall = zone(1.0, 1.0, 2.0, 0.5);
        let short = zone(1.0, 3.0, 2.0, 0.5);
        let f = RowGeometry::StripCrop.light_fractions(&tall, &short);
        assert_relative_eq!(
            f.tall_interception + f.tall_transmission,
            0.25,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            f.short_interception + f.short_transmission,
            0.75,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_tree_row_balances() {
        let tree = zone(6.0, 2.0, 3.0, 0.45);
        let alley = zone(0.8, 6.0, 2.5, 0.6);
        let geometry = RowGeometry::TreeRow {
            crown_depth: 4.0,
            crown_width: 3.0,
        };
        let f = geometry.light_fractions(&tree, &alley);
        assert_relative_eq!(f.sum(), 1.0, epsilon = ENERGY_BALANCE_TOLERANCE);
    }

    #[test]
    fn test_tree_row_crown_capped_at_row_width() {
        let tree = zone(6.0, 2.0, 3.0, 0.45);
        let alley = zone(0.8, 2.0, 2.5, 0.6);
        let capped = RowGeometry::TreeRow {
            crown_depth: 4.0,
            crown_width: 20.0,
        }
        .light_fractions(&tree, &alley);
        let exact = RowGeometry::TreeRow {
            crown_depth: 4.0,
            crown_width: 4.0,
        }
        .light_fractions(&tree, &alley);
        assert_eq!(capped, exact);
        assert_relative_eq!(capped.sum(), 1.0, epsilon = ENERGY_BALANCE_TOLERANCE);
    }

    #[test]
    fn test_tree_row_without_crown_width_fails() {
        let tree = zone(6.0, 2.0, 3.0, 0.45);
        let alley = zone(0.8, 6.0, 2.5, 0.6);
        let geometry = RowGeometry::TreeRow {
            crown_depth: 4.0,
            crown_width: 0.0,
        };
        let err = geometry.partition(20.0, &tree, &alley).unwrap_err();
        assert!(matches!(
            err,
            MicroClimateError::EnergyBalanceNotMaintained {
                model: "tree row",
                ..
            }
        ));
    }

    #[test]
    fn test_vine_row_narrow_and_wide_crowns_balance() {
        let vine = zone(2.0, 1.0, 2.0, 0.7);
        let alley = zone(0.3, 2.0, 1.0, 0.5);
        for crown_width in [0.0, 0.6, 1.0, 1.8, 3.0] {
            let f = RowGeometry::VineRow {
                crown_depth: 1.2,
                crown_width,
            }
            .light_fractions(&vine, &alley);
            assert_relative_eq!(f.sum(), 1.0, epsilon = 1e-9);
            assert!(f.tall_transmission >= 0.0);
            assert!(f.short_transmission >= 0.0);
        }
    }

    #[test]
    fn test_randomised_geometries_balance() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let tall = zone(
                rng.random_range(1.0..8.0),
                rng.random_range(0.5..5.0),
                rng.random_range(0.0..6.0),
                rng.random_range(0.2..0.9),
            );
            let short = zone(
                rng.random_range(0.0..1.0),
                rng.random_range(0.5..5.0),
                rng.random_range(0.0..4.0),
                rng.random_range(0.2..0.9),
            );
            let depth = rng.random_range(0.2..tall.height);
            let width = rng.random_range(0.1..(tall.width + short.width));
            for geometry in [
                RowGeometry::StripCrop,
                RowGeometry::TreeRow {
                    crown_depth: depth,
                    crown_width: width,
                },
                RowGeometry::VineRow {
                    crown_depth: depth,
                    crown_width: width,
                },
            ] {
                let sum = geometry.light_fractions(&tall, &short).sum();
                assert!(
                    (1.0 - sum).abs() <= ENERGY_BALANCE_TOLERANCE,
                    "{} fractions sum to {sum}",
                    geometry.name()
                );
            }
        }
    }

    #[test]
    fn test_partition_scales_to_zone_area() {
        let tall = zone(2.0, 1.0, 3.0, 0.5);
        let short = zone(0.5, 3.0, 1.0, 0.5);
        let f = RowGeometry::StripCrop.light_fractions(&tall, &short);
        let incoming = RowGeometry::StripCrop.partition(20.0, &tall, &short).unwrap();
        assert_relative_eq!(incoming.tall, 20.0 * f.tall_interception / 0.25, epsilon = 1e-12);
        assert_relative_eq!(incoming.short, 20.0 * f.short_interception / 0.75, epsilon = 1e-12);
    }
}
