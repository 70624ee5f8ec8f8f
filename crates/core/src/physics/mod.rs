//! Physics of the canopy energy balance
//!
//! Each module holds one stage of the daily pipeline. The functions work on
//! plain slices and the per-zone [`LayerStack`] / [`CanopyState`] buffers so
//! they can be tested without a full simulation.

pub mod conductance;
pub mod constants;
pub mod energy;
pub mod extinction;
pub mod interception;
pub mod layers;
pub mod longwave;
pub mod penman_monteith;
pub mod row_geometry;
pub mod shortwave;

pub use constants::{divide, PhysicalConstants};
pub use layers::{CanopyState, LayerStack};
pub use longwave::DayLengths;
pub use penman_monteith::PetTerms;
pub use row_geometry::{LightFractions, RowGeometry, RowZone, ZoneIncoming};
