//! Daily micro-climate orchestration
//!
//! `MicroClimate` owns every zone of a paddock and runs the energy balance
//! once per day:
//! - day lengths from the calendar and latitude
//! - canopy compartments (layers, leaf area, extinction) per zone
//! - shortwave partitioning, either zone by zone or with a row geometry model
//!   across a pair of strips
//! - the remaining energy and water terms per zone
//!
//! Results stay readable until the next call.

pub mod zone;

pub use zone::{CanopyEnergyTerms, LightProfileLayer, MicroClimateZone, ZoneAggregate};

use crate::config::MicroClimateConfig;
use crate::core_types::CanopyKind;
use crate::error::{MicroClimateError, Result};
use crate::physics::longwave::{day_lengths, DayLengths};
use crate::physics::row_geometry::RowGeometry;
use crate::providers::{Clock, WeatherProvider, ZoneDefinition};
use std::rc::Rc;
use tracing::{debug, info, warn};

/// How shortwave was shared out on the last simulated day
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ShortwaveStrategy {
    /// Every zone receives the full incoming radiation over its own layers
    #[default]
    Layered,
    /// Two strips of a row pattern share the radiation through a row model
    Row {
        geometry: RowGeometry,
        /// Index of the taller zone
        tall: usize,
        /// Index of the shorter zone
        short: usize,
    },
}

/// Canopy micro-climate model of one paddock
pub struct MicroClimate {
    config: MicroClimateConfig,
    weather: Rc<dyn WeatherProvider>,
    clock: Rc<dyn Clock>,
    zones: Vec<MicroClimateZone>,
    strategy: ShortwaveStrategy,
    day_lengths: DayLengths,
}

impl MicroClimate {
    /// Build the model for a paddock.
    ///
    /// The zones are the sub-zones of `parent`; a paddock without sub-zones is
    /// its own single zone.
    ///
    /// # Errors
    /// Invalid configuration, a zone without a soil water model or a strip
    /// with a non-positive width
    pub fn new(
        config: MicroClimateConfig,
        weather: Rc<dyn WeatherProvider>,
        clock: Rc<dyn Clock>,
        parent: ZoneDefinition,
        sub_zones: Vec<ZoneDefinition>,
    ) -> Result<Self> {
        config.validate()?;

        let definitions = if sub_zones.is_empty() {
            vec![parent]
        } else {
            sub_zones
        };
        let zones = definitions
            .into_iter()
            .map(MicroClimateZone::from_definition)
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Micro-climate initialised: {} zone(s), row models {}",
            zones.len(),
            if row_candidates(&zones) {
                "enabled"
            } else {
                "disabled"
            }
        );

        Ok(Self {
            config,
            weather,
            clock,
            zones,
            strategy: ShortwaveStrategy::default(),
            day_lengths: DayLengths::default(),
        })
    }

    /// Run one day of the energy balance.
    ///
    /// # Errors
    /// Any [`MicroClimateError`] raised by a stage; the day's outputs are then
    /// incomplete
    pub fn do_energy_arbitration(&mut self) -> Result<()> {
        let weather = self.weather.today();
        let day_of_year = self.clock.day_of_year();

        self.day_lengths = day_lengths(day_of_year, weather.latitude, &self.config.constants);
        if self.day_lengths.evaporative_floored {
            warn!(
                "Day {} at latitude {:.2}: evaporative day length raised to {:.2} h (two thirds of {:.2} h light)",
                day_of_year, weather.latitude, self.day_lengths.evaporative, self.day_lengths.light
            );
        }

        for zone in &mut self.zones {
            zone.reset(weather);
            zone.build_compartments(self.config.minimum_height_diff_for_new_layer)?;
        }

        self.strategy = self.select_strategy()?;
        self.distribute_shortwave(weather.radn)?;

        for zone in &mut self.zones {
            zone.run_energy_balance(day_of_year, &self.day_lengths, &self.config);
        }
        Ok(())
    }

    /// Choose the shortwave strategy from the zone geometry and the lead
    /// canopy of the taller zone
    fn select_strategy(&self) -> Result<ShortwaveStrategy> {
        if !row_candidates(&self.zones) {
            return Ok(ShortwaveStrategy::Layered);
        }

        // Ties go to the second zone
        let (tall, short) = if self.zones[0].layers().total_height()
            > self.zones[1].layers().total_height()
        {
            (0, 1)
        } else {
            (1, 0)
        };
        let tall_zone = &self.zones[tall];
        let short_zone = &self.zones[short];

        // A bare tall zone means both are bare; each takes the full radiation
        let Some(lead) = tall_zone.tallest_canopy() else {
            return Ok(ShortwaveStrategy::Layered);
        };
        let lead = &lead.descriptor;

        let tall_height = tall_zone.layers().total_height();
        let alley_height = short_zone.layers().total_height();
        let crown_depth = *lead.depth.to_meters();
        let crown_width = *lead.width.to_meters();
        let total_width = tall_zone.row_zone().width + short_zone.row_zone().width;

        let check_alley = || -> Result<()> {
            let tree_base = tall_height - crown_depth;
            if tall_zone.num_layers() > 1 && alley_height > tree_base {
                return Err(MicroClimateError::AlleyCanopyTooTall {
                    alley_height,
                    tree_base,
                });
            }
            Ok(())
        };

        let geometry = if lead.kind == CanopyKind::Tree && lead.has_clear_bole() {
            let trees = tall_zone
                .canopies()
                .iter()
                .filter(|c| c.descriptor.kind == CanopyKind::Tree && c.descriptor.has_clear_bole())
                .count();
            if trees > 1 {
                return Err(MicroClimateError::MultipleTreeCanopies {
                    zone: tall_zone.name().to_string(),
                });
            }
            check_alley()?;
            RowGeometry::TreeRow {
                crown_depth,
                crown_width,
            }
        } else if lead.kind == CanopyKind::Vine
            && crown_width > 0.0
            && crown_width <= total_width
        {
            check_alley()?;
            RowGeometry::VineRow {
                crown_depth,
                crown_width,
            }
        } else {
            // Includes hedges with no reported width or wider than the row pattern
            RowGeometry::StripCrop
        };

        debug!(
            "Zones '{}' (tall, {:.3} m) and '{}' (short, {:.3} m): {} light interception led by '{}'",
            tall_zone.name(),
            tall_height,
            short_zone.name(),
            alley_height,
            geometry.name(),
            lead.name
        );
        Ok(ShortwaveStrategy::Row {
            geometry,
            tall,
            short,
        })
    }

    fn distribute_shortwave(&mut self, radn: f64) -> Result<()> {
        match self.strategy {
            ShortwaveStrategy::Layered => {
                for zone in &mut self.zones {
                    zone.distribute_shortwave(radn)?;
                }
            }
            ShortwaveStrategy::Row {
                geometry,
                tall,
                short,
            } => {
                let incoming = geometry.partition(
                    radn,
                    &self.zones[tall].row_zone(),
                    &self.zones[short].row_zone(),
                )?;
                self.zones[tall].distribute_shortwave(incoming.tall)?;
                self.zones[short].distribute_shortwave(incoming.short)?;
            }
        }
        Ok(())
    }

    pub fn config(&self) -> &MicroClimateConfig {
        &self.config
    }

    pub fn zones(&self) -> &[MicroClimateZone] {
        &self.zones
    }

    pub fn zone(&self, name: &str) -> Option<&MicroClimateZone> {
        self.zones.iter().find(|z| z.name() == name)
    }

    /// The zone whose outputs stand for the paddock as a whole
    pub fn primary_zone(&self) -> &MicroClimateZone {
        // Construction always leaves at least the parent zone
        &self.zones[0]
    }

    pub fn strategy(&self) -> ShortwaveStrategy {
        self.strategy
    }

    pub fn day_lengths(&self) -> DayLengths {
        self.day_lengths
    }

    /// Shortwave reaching the soil of every zone (MJ/m²)
    pub fn surface_radiation(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.zones.iter().map(|z| (z.name(), z.surface_radiation()))
    }

    /// Tallest canopy over all zones (mm)
    pub fn canopy_height(&self) -> f64 {
        self.zones
            .iter()
            .map(|z| *z.canopy_height())
            .fold(0.0, f64::max)
    }

    pub fn precipitation_interception(&self) -> f64 {
        self.primary_zone().precipitation_interception()
    }

    pub fn radiation_interception(&self) -> f64 {
        self.primary_zone().radiation_interception()
    }

    pub fn pet_total(&self) -> f64 {
        self.primary_zone().pet_total()
    }

    pub fn net_radiation(&self) -> f64 {
        self.primary_zone().net_radiation()
    }

    pub fn canopy_cover(&self) -> f64 {
        self.primary_zone().canopy_cover()
    }
}

impl std::fmt::Debug for MicroClimate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MicroClimate")
            .field("config", &self.config)
            .field("zones", &self.zones)
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

/// Row models apply to exactly two strips
fn row_candidates(zones: &[MicroClimateZone]) -> bool {
    zones.len() == 2 && zones.iter().all(|z| z.geometry().is_rectangular())
}
