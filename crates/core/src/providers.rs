//! Collaborator interfaces
//!
//! The energy balance reads weather, the calendar, soil and residue state, and
//! canopy snapshots from models it does not own. Each is a small trait so the
//! host simulation can plug in its own implementation; the simple value types
//! below cover tests and stand-alone runs.

use crate::core_types::{CanopyDescriptor, WeatherSnapshot, ZoneGeometry};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Daily weather source
pub trait WeatherProvider {
    fn today(&self) -> WeatherSnapshot;
}

/// Calendar source
pub trait Clock {
    /// Day of the year, 1 to 366
    fn day_of_year(&self) -> u32;
}

/// Soil water model of a zone
pub trait SoilWaterProvider {
    /// Bare soil shortwave albedo (0-1)
    fn soil_albedo(&self) -> f64;
}

/// Surface organic matter model of a zone
pub trait SurfaceResidueProvider {
    /// Fraction of the soil surface covered by residue (0-1)
    fn residue_cover(&self) -> f64;
}

/// Anything that carries a canopy: a crop leaf organ, a pasture, a tree crown
pub trait CanopyModel {
    fn canopy(&self) -> CanopyDescriptor;
}

impl WeatherProvider for WeatherSnapshot {
    fn today(&self) -> WeatherSnapshot {
        *self
    }
}

impl WeatherProvider for RefCell<WeatherSnapshot> {
    fn today(&self) -> WeatherSnapshot {
        *self.borrow()
    }
}

impl Clock for u32 {
    fn day_of_year(&self) -> u32 {
        *self
    }
}

impl Clock for Cell<u32> {
    fn day_of_year(&self) -> u32 {
        self.get()
    }
}

impl CanopyModel for CanopyDescriptor {
    fn canopy(&self) -> CanopyDescriptor {
        self.clone()
    }
}

impl CanopyModel for RefCell<CanopyDescriptor> {
    fn canopy(&self) -> CanopyDescriptor {
        self.borrow().clone()
    }
}

/// Soil with a fixed albedo
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticSoil {
    pub albedo: f64,
}

impl SoilWaterProvider for StaticSoil {
    fn soil_albedo(&self) -> f64 {
        self.albedo
    }
}

/// Residue layer with a fixed cover
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticResidue {
    pub cover: f64,
}

impl SurfaceResidueProvider for StaticResidue {
    fn residue_cover(&self) -> f64 {
        self.cover
    }
}

/// A zone and the collaborators living in it, as handed to
/// [`MicroClimate::new`](crate::MicroClimate::new)
#[derive(Clone)]
pub struct ZoneDefinition {
    pub name: String,
    pub geometry: ZoneGeometry,
    pub canopies: Vec<Rc<dyn CanopyModel>>,
    pub soil_water: Option<Rc<dyn SoilWaterProvider>>,
    pub surface_residue: Option<Rc<dyn SurfaceResidueProvider>>,
}

impl ZoneDefinition {
    pub fn new(name: impl Into<String>, geometry: ZoneGeometry) -> Self {
        Self {
            name: name.into(),
            geometry,
            canopies: Vec::new(),
            soil_water: None,
            surface_residue: None,
        }
    }

    pub fn with_canopy(mut self, canopy: Rc<dyn CanopyModel>) -> Self {
        self.canopies.push(canopy);
        self
    }

    pub fn with_soil_water(mut self, soil: Rc<dyn SoilWaterProvider>) -> Self {
        self.soil_water = Some(soil);
        self
    }

    pub fn with_surface_residue(mut self, residue: Rc<dyn SurfaceResidueProvider>) -> Self {
        self.surface_residue = Some(residue);
        self
    }
}

impl std::fmt::Debug for ZoneDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoneDefinition")
            .field("name", &self.name)
            .field("geometry", &self.geometry)
            .field("canopies", &self.canopies.len())
            .field("soil_water", &self.soil_water.is_some())
            .field("surface_residue", &self.surface_residue.is_some())
            .finish()
    }
}
