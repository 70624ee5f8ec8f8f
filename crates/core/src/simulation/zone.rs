//! Run-time state of one micro-climate zone
//!
//! A zone owns its layer stack and one [`CanopyState`] per canopy present
//! today. Both are kept between days and overwritten in place; buffers grow or
//! shrink only when the number of layers changes.

use crate::config::{InterceptionCoefficients, MicroClimateConfig};
use crate::core_types::{CanopyDescriptor, Millimeters, WeatherSnapshot, ZoneGeometry};
use crate::error::{MicroClimateError, Result};
use crate::physics::conductance::{calculate_aerodynamic_conductance, calculate_canopy_conductance};
use crate::physics::constants::{divide, PhysicalConstants};
use crate::physics::energy::{scale_by_shortwave, soil_heat_flux, surface_properties};
use crate::physics::extinction::calculate_extinction;
use crate::physics::interception::{calculate_interception, potential_infiltration};
use crate::physics::layers::{distribute_leaf_area, layer_boundaries, CanopyState, LayerStack};
use crate::physics::longwave::{fraction_clear_sky, net_long_wave_daily, DayLengths};
use crate::physics::penman_monteith::{
    calculate_omega, calculate_pet, dry_leaf_fraction, soil_potential_evaporation,
};
use crate::physics::row_geometry::RowZone;
use crate::physics::shortwave::distribute_layered;
use crate::providers::{CanopyModel, SoilWaterProvider, SurfaceResidueProvider, ZoneDefinition};
use std::rc::Rc;
use tracing::debug;

/// Zone-level results of one day
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ZoneAggregate {
    /// Shortwave albedo of canopy and soil
    pub albedo: f64,
    /// Long wave emissivity of canopy and soil
    pub emissivity: f64,
    /// Net long wave over the evaporative day (MJ/m²)
    pub net_long_wave: f64,
    /// Shortwave intercepted by all canopies (MJ/m²)
    pub sum_rs: f64,
    /// Shortwave reaching the soil surface (MJ/m²)
    pub surface_rs: f64,
    /// Soil heat flux (MJ/m²), negative into the soil
    pub soil_heat_flux: f64,
    /// Fraction of the day the leaves are dry
    pub dry_leaf_fraction: f64,
    /// Rain held on the canopy (mm)
    pub precipitation_interception: f64,
    /// Rain reaching the soil surface (mm)
    pub potential_infiltration: f64,
    pub soil_albedo: f64,
    /// Residue cover of the soil surface, when the zone has a residue model
    pub residue_cover: Option<f64>,
    /// Potential soil evaporation (mm), when the zone has a residue model
    pub eo: Option<f64>,
}

/// Shortwave on green leaf in one layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightProfileLayer {
    /// Layer thickness (m)
    pub thickness: f64,
    /// Shortwave intercepted by green leaf (MJ/m²)
    pub amount: f64,
}

/// Energy terms handed back to a canopy's owner
#[derive(Debug, Clone, PartialEq)]
pub struct CanopyEnergyTerms {
    pub name: String,
    /// Potential transpiration (mm), the canopy's PET summed over layers
    pub potential_ep: f64,
    /// Green-leaf light per layer, bottom layer first
    pub light_profile: Vec<LightProfileLayer>,
}

/// One zone of the micro-climate model
pub struct MicroClimateZone {
    name: String,
    geometry: ZoneGeometry,
    canopy_models: Vec<Rc<dyn CanopyModel>>,
    soil_water: Rc<dyn SoilWaterProvider>,
    surface_residue: Option<Rc<dyn SurfaceResidueProvider>>,

    weather: WeatherSnapshot,
    stack: LayerStack,
    canopies: Vec<CanopyState>,
    aggregate: ZoneAggregate,
    energy_terms: Vec<CanopyEnergyTerms>,
}

impl MicroClimateZone {
    /// Resolve a zone's collaborators.
    ///
    /// # Errors
    /// [`MicroClimateError::MissingCollaborator`] without a soil water model,
    /// [`MicroClimateError::InvalidZoneGeometry`] for a rectangular zone
    /// whose width is not positive
    pub fn from_definition(definition: ZoneDefinition) -> Result<Self> {
        let ZoneDefinition {
            name,
            geometry,
            canopies,
            soil_water,
            surface_residue,
        } = definition;

        if let Some(width) = geometry.width() {
            if width.is_nan() || *width <= 0.0 {
                return Err(MicroClimateError::InvalidZoneGeometry { zone: name, width: *width });
            }
        }
        let Some(soil_water) = soil_water else {
            return Err(MicroClimateError::MissingCollaborator {
                zone: name,
                collaborator: "soil water provider",
            });
        };

        Ok(Self {
            name,
            geometry,
            canopy_models: canopies,
            soil_water,
            surface_residue,
            weather: WeatherSnapshot::default(),
            stack: LayerStack::default(),
            canopies: Vec::new(),
            aggregate: ZoneAggregate::default(),
            energy_terms: Vec::new(),
        })
    }

    /// Start a new day: take the weather and clear yesterday's results
    pub(crate) fn reset(&mut self, weather: WeatherSnapshot) {
        self.weather = weather;
        self.aggregate = ZoneAggregate {
            soil_albedo: self.soil_water.soil_albedo(),
            ..ZoneAggregate::default()
        };
    }

    /// Snapshot today's canopies, rebuild the layers and spread leaf area and
    /// extinction over them.
    pub(crate) fn build_compartments(&mut self, min_height_diff: f64) -> Result<()> {
        let descriptors: Vec<CanopyDescriptor> = self
            .canopy_models
            .iter()
            .map(|model| model.canopy())
            .filter(CanopyDescriptor::is_present)
            .collect();

        let boundaries = layer_boundaries(&descriptors, min_height_diff);
        self.stack.rebuild(&boundaries);
        let n = self.stack.num_layers();

        self.canopies.truncate(descriptors.len());
        for (i, descriptor) in descriptors.into_iter().enumerate() {
            match self.canopies.get_mut(i) {
                Some(state) => state.reset(descriptor, n),
                None => {
                    let mut state = CanopyState::new(descriptor.clone());
                    state.reset(descriptor, n);
                    self.canopies.push(state);
                }
            }
        }

        distribute_leaf_area(&mut self.stack, &mut self.canopies);
        calculate_extinction(&mut self.stack, &mut self.canopies)
    }

    /// Sweep `incoming` shortwave (MJ/m² of this zone's ground) down the layers
    pub(crate) fn distribute_shortwave(&mut self, incoming: f64) -> Result<()> {
        self.aggregate.surface_rs = distribute_layered(&self.name, incoming, &self.stack, &mut self.canopies)?;
        Ok(())
    }

    /// Run the stages after shortwave partitioning, in pipeline order
    pub(crate) fn run_energy_balance(
        &mut self,
        day_of_year: u32,
        day_lengths: &DayLengths,
        config: &MicroClimateConfig,
    ) {
        let constants = &config.constants;
        self.calculate_energy_terms(constants);
        self.calculate_long_wave(day_of_year, day_lengths, constants);
        self.calculate_soil_heat(config.soil_heat_flux_fraction);
        calculate_canopy_conductance(
            self.weather.radn,
            self.aggregate.albedo,
            day_lengths.evaporative,
            &self.stack,
            &mut self.canopies,
        );
        calculate_aerodynamic_conductance(
            self.weather.wind,
            config.reference_height,
            self.aggregate.sum_rs,
            &self.stack,
            &mut self.canopies,
            constants,
        );
        self.calculate_interception(&config.interception);
        self.calculate_evapotranspiration(
            config.night_interception_fraction,
            day_lengths.evaporative,
            constants,
        );
        calculate_omega(&mut self.canopies, &self.weather, constants);
        self.set_canopy_energy_terms();
        self.calculate_soil_evaporation(constants);

        debug!(
            "Zone '{}': {} layers, intercepted {:.3} MJ/m2, surface {:.3} MJ/m2, PET {:.3} mm",
            self.name,
            self.num_layers(),
            self.aggregate.sum_rs,
            self.aggregate.surface_rs,
            self.pet_total()
        );
    }

    fn calculate_energy_terms(&mut self, constants: &PhysicalConstants) {
        let props = surface_properties(
            self.weather.radn,
            &self.canopies,
            self.aggregate.soil_albedo,
            constants,
        );
        self.aggregate.albedo = props.albedo;
        self.aggregate.emissivity = props.emissivity;
        self.aggregate.sum_rs = props.sum_rs;
    }

    fn calculate_long_wave(
        &mut self,
        day_of_year: u32,
        day_lengths: &DayLengths,
        constants: &PhysicalConstants,
    ) {
        let w = &self.weather;
        let clear_sky = fraction_clear_sky(w.radn, day_lengths.light, w.latitude, day_of_year);
        let net = net_long_wave_daily(
            w.day_weighted_temperature(),
            clear_sky,
            self.aggregate.emissivity,
            day_lengths.evaporative,
            constants,
        );
        self.aggregate.net_long_wave = net;
        for canopy in &mut self.canopies {
            scale_by_shortwave(w.radn, net, &canopy.rs, &mut canopy.rl);
        }
    }

    fn calculate_soil_heat(&mut self, fraction: f64) {
        let radn = self.weather.radn;
        let flux = soil_heat_flux(radn, self.aggregate.sum_rs, fraction);
        self.aggregate.soil_heat_flux = flux;
        for canopy in &mut self.canopies {
            scale_by_shortwave(radn, flux, &canopy.rs, &mut canopy.rsoil);
        }
    }

    fn calculate_interception(&mut self, coefficients: &InterceptionCoefficients) {
        let rain = self.weather.rain;
        let held = calculate_interception(coefficients, rain, &mut self.canopies);
        self.aggregate.precipitation_interception = held;
        self.aggregate.potential_infiltration = potential_infiltration(rain, held);
    }

    fn calculate_evapotranspiration(
        &mut self,
        night_interception_fraction: f64,
        day_length_evap: f64,
        constants: &PhysicalConstants,
    ) {
        let dry = dry_leaf_fraction(
            &self.canopies,
            self.aggregate.albedo,
            self.aggregate.sum_rs,
            day_length_evap,
            night_interception_fraction,
            &self.weather,
            constants,
        );
        self.aggregate.dry_leaf_fraction = dry;
        calculate_pet(
            &mut self.canopies,
            self.aggregate.albedo,
            dry,
            day_length_evap,
            &self.weather,
            constants,
        );
    }

    fn set_canopy_energy_terms(&mut self) {
        self.energy_terms.clear();
        for canopy in &self.canopies {
            let green = canopy.descriptor.green_radiation_fraction();
            let light_profile = self
                .stack
                .delta_z
                .iter()
                .zip(&canopy.rs)
                .map(|(&thickness, &rs)| LightProfileLayer {
                    thickness,
                    amount: rs * green,
                })
                .collect();
            self.energy_terms.push(CanopyEnergyTerms {
                name: canopy.descriptor.name.clone(),
                potential_ep: canopy.pet.iter().sum(),
                light_profile,
            });
        }
    }

    fn calculate_soil_evaporation(&mut self, constants: &PhysicalConstants) {
        let Some(residue) = &self.surface_residue else {
            return;
        };
        // Combined green cover, each canopy covering what the others leave
        let cover_green = self
            .canopies
            .iter()
            .fold(0.0, |cg, c| cg + (1.0 - cg) * c.descriptor.cover_green);
        self.aggregate.residue_cover = Some(residue.residue_cover());
        self.aggregate.eo = Some(soil_potential_evaporation(
            &self.weather,
            self.aggregate.soil_albedo,
            cover_green,
            constants,
        ));
    }

    /// Row-scale summary used by the row geometry models
    pub fn row_zone(&self) -> RowZone {
        RowZone {
            height: self.stack.total_height(),
            width: self.geometry.width().map_or(0.0, |w| *w),
            lai: self.stack.total_lai(),
            ktot: self.canopies.first().map_or(0.0, |c| c.ktot),
        }
    }

    /// Tallest canopy present today
    pub fn tallest_canopy(&self) -> Option<&CanopyState> {
        self.canopies.iter().max_by_key(|c| c.descriptor.height)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> ZoneGeometry {
        self.geometry
    }

    pub fn weather(&self) -> &WeatherSnapshot {
        &self.weather
    }

    pub fn layers(&self) -> &LayerStack {
        &self.stack
    }

    pub fn canopies(&self) -> &[CanopyState] {
        &self.canopies
    }

    pub fn aggregate(&self) -> &ZoneAggregate {
        &self.aggregate
    }

    pub fn canopy_energy_terms(&self) -> &[CanopyEnergyTerms] {
        &self.energy_terms
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.stack.num_layers()
    }

    /// Height of the tallest canopy, zero when there is none
    pub fn canopy_height(&self) -> Millimeters {
        self.tallest_canopy()
            .map_or(Millimeters::ZERO, |c| c.descriptor.height)
    }

    /// Shortwave intercepted by all canopies (MJ/m²)
    pub fn radiation_interception(&self) -> f64 {
        self.aggregate.sum_rs
    }

    /// Shortwave intercepted by green leaf (MJ/m²)
    pub fn radiation_interception_on_green(&self) -> f64 {
        self.canopies
            .iter()
            .map(|c| c.descriptor.green_radiation_fraction() * c.rs.iter().sum::<f64>())
            .sum()
    }

    /// Shortwave reaching the soil surface (MJ/m²)
    pub fn surface_radiation(&self) -> f64 {
        self.aggregate.surface_rs
    }

    /// Fraction of incoming shortwave intercepted by the canopy
    pub fn canopy_cover(&self) -> f64 {
        divide(self.aggregate.sum_rs, self.weather.radn, 0.0)
    }

    pub fn net_short_wave(&self) -> f64 {
        self.weather.radn * (1.0 - self.aggregate.albedo)
    }

    pub fn net_long_wave(&self) -> f64 {
        self.aggregate.net_long_wave
    }

    pub fn net_radiation(&self) -> f64 {
        self.net_short_wave() + self.net_long_wave()
    }

    pub fn soil_heat_flux(&self) -> f64 {
        self.aggregate.soil_heat_flux
    }

    pub fn dry_leaf_fraction(&self) -> f64 {
        self.aggregate.dry_leaf_fraction
    }

    pub fn precipitation_interception(&self) -> f64 {
        self.aggregate.precipitation_interception
    }

    pub fn potential_infiltration(&self) -> f64 {
        self.aggregate.potential_infiltration
    }

    /// Potential soil evaporation (mm), only for zones with a residue model
    pub fn soil_evaporation(&self) -> Option<f64> {
        self.aggregate.eo
    }

    /// Radiation term of PET summed over canopies and layers (mm)
    pub fn pet_radiation_term(&self) -> f64 {
        self.canopies.iter().flat_map(|c| c.petr.iter()).sum()
    }

    /// Aerodynamic term of PET summed over canopies and layers (mm)
    pub fn pet_aerodynamic_term(&self) -> f64 {
        self.canopies.iter().flat_map(|c| c.peta.iter()).sum()
    }

    /// PET summed over canopies and layers (mm)
    pub fn pet_total(&self) -> f64 {
        self.canopies.iter().flat_map(|c| c.pet.iter()).sum()
    }
}

impl std::fmt::Debug for MicroClimateZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MicroClimateZone")
            .field("name", &self.name)
            .field("geometry", &self.geometry)
            .field("layers", &self.stack.num_layers())
            .field("canopies", &self.canopies.len())
            .field("aggregate", &self.aggregate)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::CanopyKind;
    use crate::physics::longwave::day_lengths;
    use crate::providers::{StaticResidue, StaticSoil};
    use approx::assert_relative_eq;
    use std::cell::RefCell;

    fn soil() -> Rc<dyn SoilWaterProvider> {
        Rc::new(StaticSoil { albedo: 0.13 })
    }

    fn run_day(zone: &mut MicroClimateZone, weather: WeatherSnapshot) {
        let config = MicroClimateConfig::default();
        zone.reset(weather);
        zone.build_compartments(0.0).unwrap();
        zone.distribute_shortwave(weather.radn).unwrap();
        let dl = day_lengths(180, weather.latitude, &config.constants);
        zone.run_energy_balance(180, &dl, &config);
    }

    #[test]
    fn test_missing_soil_water_is_rejected() {
        let definition = ZoneDefinition::new("paddock", ZoneGeometry::Unbounded);
        let err = MicroClimateZone::from_definition(definition).unwrap_err();
        assert!(matches!(
            err,
            MicroClimateError::MissingCollaborator { ref zone, .. } if zone == "paddock"
        ));
    }

    #[test]
    fn test_zero_width_strip_is_rejected() {
        let definition =
            ZoneDefinition::new("strip", ZoneGeometry::rectangular(0.0)).with_soil_water(soil());
        assert!(matches!(
            MicroClimateZone::from_definition(definition),
            Err(MicroClimateError::InvalidZoneGeometry { .. })
        ));
    }

    #[test]
    fn test_absent_canopies_are_skipped() {
        let definition = ZoneDefinition::new("paddock", ZoneGeometry::Unbounded)
            .with_soil_water(soil())
            .with_canopy(Rc::new(CanopyDescriptor::new("fallow", 0.0, 0.0)));
        let mut zone = MicroClimateZone::from_definition(definition).unwrap();
        run_day(&mut zone, WeatherSnapshot::default());
        assert_eq!(zone.num_layers(), 0);
        assert!(zone.canopies().is_empty());
        assert_eq!(zone.surface_radiation(), 20.0);
        assert_eq!(zone.canopy_height(), Millimeters::ZERO);
        assert_eq!(zone.pet_total(), 0.0);
    }

    #[test]
    fn test_buffers_follow_layer_count() {
        let wheat = Rc::new(RefCell::new(
            CanopyDescriptor::new("wheat", 800.0, 800.0)
                .with_lai(2.0, 2.5)
                .with_cover(0.6, 0.7),
        ));
        let definition = ZoneDefinition::new("paddock", ZoneGeometry::Unbounded)
            .with_soil_water(soil())
            .with_canopy(wheat.clone())
            .with_canopy(Rc::new(
                CanopyDescriptor::new("clover", 200.0, 200.0)
                    .with_lai(1.0, 1.0)
                    .with_cover(0.4, 0.4),
            ));
        let mut zone = MicroClimateZone::from_definition(definition).unwrap();
        run_day(&mut zone, WeatherSnapshot::default());
        assert_eq!(zone.num_layers(), 2);
        assert!(zone.canopies().iter().all(|c| c.rs.len() == 2));

        // Wheat harvested: one canopy, one layer
        wheat.borrow_mut().height = Millimeters::ZERO;
        run_day(&mut zone, WeatherSnapshot::default());
        assert_eq!(zone.num_layers(), 1);
        assert_eq!(zone.canopies().len(), 1);
        assert_eq!(zone.canopies()[0].descriptor.name, "clover");
        assert_eq!(zone.canopies()[0].rs.len(), 1);
    }

    #[test]
    fn test_daily_outputs_are_consistent() {
        let definition = ZoneDefinition::new("paddock", ZoneGeometry::Unbounded)
            .with_soil_water(soil())
            .with_surface_residue(Rc::new(StaticResidue { cover: 0.3 }))
            .with_canopy(Rc::new(
                CanopyDescriptor::new("maize", 2000.0, 1500.0)
                    .with_kind(CanopyKind::Generic)
                    .with_lai(3.0, 3.5)
                    .with_cover(0.75, 0.8),
            ));
        let mut zone = MicroClimateZone::from_definition(definition).unwrap();
        let weather = WeatherSnapshot::default();
        run_day(&mut zone, weather);

        assert_relative_eq!(
            zone.radiation_interception() + zone.surface_radiation(),
            weather.radn,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            zone.pet_total(),
            zone.pet_radiation_term() + zone.pet_aerodynamic_term(),
            epsilon = 1e-12
        );
        assert!(zone.radiation_interception_on_green() <= zone.radiation_interception());
        assert_relative_eq!(zone.canopy_cover(), zone.radiation_interception() / weather.radn);
        assert_eq!(*zone.canopy_height(), 2000.0);
        assert_eq!(zone.dry_leaf_fraction(), 1.0);
        assert_eq!(zone.aggregate().residue_cover, Some(0.3));
        assert!(zone.soil_evaporation().is_some_and(|eo| eo > 0.0));

        let terms = &zone.canopy_energy_terms()[0];
        assert_eq!(terms.name, "maize");
        assert_relative_eq!(terms.potential_ep, zone.pet_total(), epsilon = 1e-12);
        assert_eq!(terms.light_profile.len(), zone.num_layers());
    }

    #[test]
    fn test_no_residue_model_no_soil_evaporation() {
        let definition =
            ZoneDefinition::new("paddock", ZoneGeometry::Unbounded).with_soil_water(soil());
        let mut zone = MicroClimateZone::from_definition(definition).unwrap();
        run_day(&mut zone, WeatherSnapshot::default());
        assert_eq!(zone.soil_evaporation(), None);
    }
}
