//! Core types shared by the physics and simulation modules

pub mod canopy;
pub mod units;
pub mod weather;
pub mod zone;

pub use canopy::{CanopyDescriptor, CanopyKind};
pub use units::{Meters, Millimeters};
pub use weather::WeatherSnapshot;
pub use zone::ZoneGeometry;
