//! Semantic length types for canopy and zone geometry
//!
//! Plant models report canopy height, depth and crown width in millimetres
//! while zone widths and the layer stack work in metres. Wrapping both in
//! newtypes keeps the two scales from being mixed silently.
//!
//! # Usage
//! ```
//! use micromet_core::core_types::units::{Meters, Millimeters};
//!
//! let height = Millimeters::new(1500.0);
//! let metres: Meters = height.into();
//! assert!((*metres - 1.5).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;

/// Length in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Millimeters(f64);

impl Eq for Millimeters {}

impl PartialOrd for Millimeters {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Millimeters {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Deref for Millimeters {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Millimeters {
    /// Millimetres per metre
    const PER_METER: f64 = 1000.0;

    /// Zero length
    pub const ZERO: Millimeters = Millimeters(0.0);

    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Millimeters(value)
    }

    /// Convert to metres
    #[inline]
    #[must_use]
    pub fn to_meters(self) -> Meters {
        Meters(self.0 / Self::PER_METER)
    }

    /// Convert to metres after rounding to 5 decimal places.
    ///
    /// Plant models accumulate floating point noise in heights; rounding keeps
    /// nearly coincident canopy boundaries on the same layer node.
    #[inline]
    #[must_use]
    pub fn to_meters_rounded(self) -> Meters {
        Meters((self.0 * 1e5).round() / 1e5 / Self::PER_METER)
    }
}

impl From<Millimeters> for Meters {
    fn from(mm: Millimeters) -> Meters {
        mm.to_meters()
    }
}

impl From<f64> for Millimeters {
    fn from(v: f64) -> Self {
        Millimeters(v)
    }
}

impl fmt::Display for Millimeters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} mm", self.0)
    }
}

/// Length in metres
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Meters(f64);

impl Eq for Meters {}

impl PartialOrd for Meters {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Meters {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Deref for Meters {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Meters {
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Meters(value)
    }
}

impl From<f64> for Meters {
    fn from(v: f64) -> Self {
        Meters(v)
    }
}

impl fmt::Display for Meters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} m", self.0)
    }
}
