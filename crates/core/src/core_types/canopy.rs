//! Daily canopy snapshot supplied by plant models
//!
//! The energy balance never changes a canopy. It reads one
//! [`CanopyDescriptor`] per canopy per day and writes its results into its own
//! per-layer buffers.

use crate::core_types::units::Millimeters;
use serde::{Deserialize, Serialize};

/// Geometry tag used to pick a row light-interception model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CanopyKind {
    /// Field crop, pasture or surface cover with no row-specific geometry
    #[default]
    Generic,
    /// Tree crown with a clear bole below it
    Tree,
    /// Trellised vine hedge
    Vine,
}

/// One canopy's geometry and cover for the current day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanopyDescriptor {
    pub name: String,
    pub kind: CanopyKind,
    /// Height of the canopy top above ground
    pub height: Millimeters,
    /// Vertical extent of foliage measured down from the top
    pub depth: Millimeters,
    /// Crown width across the row
    pub width: Millimeters,
    /// Green leaf area index (m²/m²)
    pub lai: f64,
    /// Green plus senesced leaf area index (m²/m²)
    pub lai_total: f64,
    /// Fraction of ground shaded by green leaf (0-1)
    pub cover_green: f64,
    /// Fraction of ground shaded by all leaf (0-1)
    pub cover_total: f64,
    /// Shortwave reflectance of the canopy (0-1)
    pub albedo: f64,
    /// Maximum stomatal conductance (m/s)
    pub gsmax: f64,
    /// Radiation at which stomatal conductance falls to half its maximum (W/m²)
    pub r50: f64,
}

impl CanopyDescriptor {
    /// Create a generic canopy with no leaf area.
    ///
    /// Defaults follow typical crop values: albedo 0.15, gsmax 0.01 m/s and
    /// r50 200 W/m².
    pub fn new(name: impl Into<String>, height_mm: f64, depth_mm: f64) -> Self {
        Self {
            name: name.into(),
            kind: CanopyKind::Generic,
            height: Millimeters::new(height_mm),
            depth: Millimeters::new(depth_mm),
            width: Millimeters::ZERO,
            lai: 0.0,
            lai_total: 0.0,
            cover_green: 0.0,
            cover_total: 0.0,
            albedo: 0.15,
            gsmax: 0.01,
            r50: 200.0,
        }
    }

    pub fn with_kind(mut self, kind: CanopyKind) -> Self {
        self.kind = kind;
        self
    }

    /// Green and total leaf area index
    pub fn with_lai(mut self, lai: f64, lai_total: f64) -> Self {
        self.lai = lai;
        self.lai_total = lai_total;
        self
    }

    /// Green and total cover
    pub fn with_cover(mut self, cover_green: f64, cover_total: f64) -> Self {
        self.cover_green = cover_green;
        self.cover_total = cover_total;
        self
    }

    pub fn with_albedo(mut self, albedo: f64) -> Self {
        self.albedo = albedo;
        self
    }

    pub fn with_width(mut self, width_mm: f64) -> Self {
        self.width = Millimeters::new(width_mm);
        self
    }

    /// Stomatal parameters: `gsmax` (m/s) and `r50` (W/m²)
    pub fn with_conductance(mut self, gsmax: f64, r50: f64) -> Self {
        self.gsmax = gsmax;
        self.r50 = r50;
        self
    }

    /// Whether the canopy takes part in today's energy balance
    #[inline]
    pub fn is_present(&self) -> bool {
        *self.height > 0.0
    }

    /// Whether the crown sits on a bare stem (tree-row candidate)
    #[inline]
    pub fn has_clear_bole(&self) -> bool {
        self.depth < self.height
    }

    /// Fraction of intercepted light that falls on green leaf.
    ///
    /// Ratio of the green to total Beer-Lambert optical depths.
    pub fn green_radiation_fraction(&self) -> f64 {
        let kl_green = -(1.0 - self.cover_green).ln();
        let kl_total = -(1.0 - self.cover_total).ln();
        crate::physics::constants::divide(kl_green, kl_total, 0.0)
    }
}
