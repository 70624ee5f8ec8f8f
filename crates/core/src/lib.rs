//! Canopy Micro-Climate Core Library
//!
//! A daily energy-balance engine for one or more plant canopies sharing a
//! paddock. Each day it layers the canopies, partitions shortwave and long
//! wave radiation and soil heat between them, derives canopy and aerodynamic
//! conductance, rainfall interception and Penman-Monteith potential
//! evapotranspiration, and reports the results per zone.
//!
//! ## Row plantings
//!
//! Two rectangular zones side by side are treated as a repeating row pattern.
//! Light is shared between them with a strip-crop, tree-row or vine-row model
//! chosen from the lead canopy of the taller zone.
//!
//! ```
//! use micromet_core::{
//!     CanopyDescriptor, MicroClimate, MicroClimateConfig, StaticSoil, WeatherSnapshot,
//!     ZoneDefinition, ZoneGeometry,
//! };
//! use std::rc::Rc;
//!
//! let paddock = ZoneDefinition::new("paddock", ZoneGeometry::Unbounded)
//!     .with_soil_water(Rc::new(StaticSoil { albedo: 0.13 }))
//!     .with_canopy(Rc::new(
//!         CanopyDescriptor::new("wheat", 800.0, 800.0)
//!             .with_lai(3.0, 3.5)
//!             .with_cover(0.7, 0.75),
//!     ));
//! let mut model = MicroClimate::new(
//!     MicroClimateConfig::default(),
//!     Rc::new(WeatherSnapshot::default()),
//!     Rc::new(200_u32),
//!     paddock,
//!     Vec::new(),
//! )
//! .unwrap();
//! model.do_energy_arbitration().unwrap();
//! assert!(model.radiation_interception() > 0.0);
//! ```

pub mod config;
pub mod core_types;
pub mod error;
pub mod physics;
pub mod providers;
pub mod simulation;

pub use config::{InterceptionCoefficients, MicroClimateConfig};
pub use core_types::{CanopyDescriptor, CanopyKind, Meters, Millimeters, WeatherSnapshot, ZoneGeometry};
pub use error::{MicroClimateError, Result};
pub use physics::{PhysicalConstants, RowGeometry};
pub use providers::{
    CanopyModel, Clock, SoilWaterProvider, StaticResidue, StaticSoil, SurfaceResidueProvider,
    WeatherProvider, ZoneDefinition,
};
pub use simulation::{
    CanopyEnergyTerms, LightProfileLayer, MicroClimate, MicroClimateZone, ShortwaveStrategy,
    ZoneAggregate,
};
