//! Zone geometry

use crate::core_types::units::Meters;
use serde::{Deserialize, Serialize};

/// Horizontal extent of a zone
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ZoneGeometry {
    /// Horizontally homogeneous field; only vertical layering matters
    #[default]
    Unbounded,
    /// Strip of a repeating row pattern with a fixed width across the row
    Rectangular { width: Meters },
}

impl ZoneGeometry {
    pub fn rectangular(width_m: f64) -> Self {
        ZoneGeometry::Rectangular {
            width: Meters::new(width_m),
        }
    }

    /// Row width, if the zone is a strip
    pub fn width(&self) -> Option<Meters> {
        match self {
            ZoneGeometry::Unbounded => None,
            ZoneGeometry::Rectangular { width } => Some(*width),
        }
    }

    pub fn is_rectangular(&self) -> bool {
        matches!(self, ZoneGeometry::Rectangular { .. })
    }
}
