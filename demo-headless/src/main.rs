use anyhow::{bail, Context, Result};
use clap::Parser;
use micromet_core::{
    CanopyDescriptor, CanopyKind, MicroClimate, MicroClimateConfig, ShortwaveStrategy,
    StaticResidue, StaticSoil, WeatherSnapshot, ZoneDefinition, ZoneGeometry,
};
use std::cell::{Cell, RefCell};
use std::f64::consts::PI;
use std::rc::Rc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Canopy micro-climate demo over a synthetic season
#[derive(Parser, Debug)]
#[command(name = "micromet-demo")]
#[command(about = "Daily canopy energy balance for a synthetic season", long_about = None)]
struct Args {
    /// Planting layout (single, strip, tree, vine)
    #[arg(short, long, default_value = "single")]
    scenario: String,

    /// Number of days to simulate
    #[arg(short, long, default_value_t = 120)]
    days: u32,

    /// First day of year
    #[arg(long, default_value_t = 150)]
    start_day: u32,

    /// Latitude in degrees (negative south)
    #[arg(short, long, default_value_t = -27.5, allow_negative_numbers = true)]
    latitude: f64,

    /// TOML file with model configuration overrides
    #[arg(short, long)]
    config: Option<String>,

    /// Print every n-th day
    #[arg(short, long, default_value_t = 10)]
    report_interval: u32,
}

/// A canopy that grows along a logistic leaf area curve
struct GrowingCanopy {
    descriptor: Rc<RefCell<CanopyDescriptor>>,
    max_lai: f64,
    max_height: f64,
    /// Height to crown depth ratio; 1 for canopies without a clear bole
    depth_ratio: f64,
}

impl GrowingCanopy {
    fn new(descriptor: CanopyDescriptor, max_lai: f64, depth_ratio: f64) -> Self {
        let max_height = *descriptor.height;
        Self {
            descriptor: Rc::new(RefCell::new(descriptor)),
            max_lai,
            max_height,
            depth_ratio,
        }
    }

    /// Set the canopy for `day` days after sowing
    fn grow(&self, day: u32) {
        let progress = 1.0 / (1.0 + (-(f64::from(day) - 50.0) / 10.0).exp());
        let lai = self.max_lai * progress;
        let lai_total = lai * 1.15;
        let mut d = self.descriptor.borrow_mut();
        d.lai = lai;
        d.lai_total = lai_total;
        // Cover from a nominal extinction coefficient of 0.5
        d.cover_green = 1.0 - (-0.5 * lai).exp();
        d.cover_total = 1.0 - (-0.5 * lai_total).exp();
        let height = self.max_height * (0.2 + 0.8 * progress);
        d.height = height.into();
        d.depth = (height * self.depth_ratio).into();
    }
}

fn soil() -> Rc<StaticSoil> {
    Rc::new(StaticSoil { albedo: 0.13 })
}

fn strip(name: &str, width: f64, canopy: &GrowingCanopy) -> ZoneDefinition {
    ZoneDefinition::new(name, ZoneGeometry::rectangular(width))
        .with_soil_water(soil())
        .with_surface_residue(Rc::new(StaticResidue { cover: 0.1 }))
        .with_canopy(canopy.descriptor.clone())
}

/// Zones and growing canopies for a scenario
fn build_scenario(name: &str) -> Result<(Vec<ZoneDefinition>, Vec<GrowingCanopy>)> {
    let scenario = match name.to_lowercase().as_str() {
        "single" => {
            let wheat = GrowingCanopy::new(CanopyDescriptor::new("wheat", 900.0, 900.0), 4.0, 1.0);
            let zone = ZoneDefinition::new("paddock", ZoneGeometry::Unbounded)
                .with_soil_water(soil())
                .with_surface_residue(Rc::new(StaticResidue { cover: 0.3 }))
                .with_canopy(wheat.descriptor.clone());
            (vec![zone], vec![wheat])
        }
        "strip" => {
            let maize = GrowingCanopy::new(CanopyDescriptor::new("maize", 2400.0, 2400.0), 4.5, 0.8);
            let soy = GrowingCanopy::new(CanopyDescriptor::new("soybean", 800.0, 800.0), 3.0, 1.0);
            let zones = vec![strip("maize", 2.0, &maize), strip("soybean", 3.0, &soy)];
            (zones, vec![maize, soy])
        }
        "tree" => {
            let gum = GrowingCanopy::new(
                CanopyDescriptor::new("eucalypt", 8000.0, 5000.0)
                    .with_kind(CanopyKind::Tree)
                    .with_width(4000.0),
                3.0,
                0.6,
            );
            let pasture = GrowingCanopy::new(CanopyDescriptor::new("pasture", 400.0, 400.0), 2.5, 1.0);
            let zones = vec![strip("trees", 2.0, &gum), strip("alley", 8.0, &pasture)];
            (zones, vec![gum, pasture])
        }
        "vine" => {
            let shiraz = GrowingCanopy::new(
                CanopyDescriptor::new("shiraz", 1800.0, 1000.0)
                    .with_kind(CanopyKind::Vine)
                    .with_width(1200.0),
                2.0,
                0.55,
            );
            let sward = GrowingCanopy::new(CanopyDescriptor::new("sward", 250.0, 250.0), 1.5, 1.0);
            let zones = vec![strip("vines", 1.0, &shiraz), strip("inter-row", 2.0, &sward)];
            (zones, vec![shiraz, sward])
        }
        other => bail!("Unknown scenario '{}' (expected single, strip, tree or vine)", other),
    };
    Ok(scenario)
}

/// Smooth seasonal weather with a rain event each week
fn synthetic_weather(day_of_year: u32, latitude: f64) -> WeatherSnapshot {
    // Peak of summer near the solstice of the hemisphere
    let summer = if latitude < 0.0 { 355.0 } else { 172.0 };
    let season = (2.0 * PI * (f64::from(day_of_year) - summer) / 365.25).cos();
    WeatherSnapshot {
        radn: 17.0 + 8.0 * season,
        max_t: 24.0 + 8.0 * season,
        min_t: 11.0 + 7.0 * season,
        rain: if day_of_year % 7 == 0 { 12.0 } else { 0.0 },
        vp: 14.0 + 5.0 * season,
        air_pressure: 1013.0,
        wind: 2.5,
        latitude,
    }
}

fn load_config(path: Option<&str>) -> Result<MicroClimateConfig> {
    let Some(path) = path else {
        return Ok(MicroClimateConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file '{}'", path))?;
    MicroClimateConfig::from_toml_str(&text)
        .with_context(|| format!("Invalid configuration in '{}'", path))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let (mut zones, canopies) = build_scenario(&args.scenario)?;

    let weather = Rc::new(RefCell::new(synthetic_weather(args.start_day, args.latitude)));
    let clock = Rc::new(Cell::new(args.start_day));

    // A single-zone paddock is its own parent
    let (parent, sub_zones) = if zones.len() == 1 {
        (zones.remove(0), Vec::new())
    } else {
        (
            ZoneDefinition::new("field", ZoneGeometry::Unbounded).with_soil_water(soil()),
            zones,
        )
    };
    let mut model = MicroClimate::new(config, weather.clone(), clock.clone(), parent, sub_zones)?;

    info!(
        "Running '{}' for {} days from day {} at latitude {:.1}",
        args.scenario, args.days, args.start_day, args.latitude
    );
    info!(
        "Weather measured {:.1} m above the canopy, {} zone(s)",
        model.config().reference_height,
        model.zones().len()
    );
    println!("=== Canopy Micro-Climate Demo ===\n");

    let interval = args.report_interval.max(1);
    for day in 0..args.days {
        let day_of_year = (args.start_day + day + 364) % 365 + 1;
        clock.set(day_of_year);
        *weather.borrow_mut() = synthetic_weather(day_of_year, args.latitude);
        for canopy in &canopies {
            canopy.grow(day);
        }

        model
            .do_energy_arbitration()
            .with_context(|| format!("Energy balance failed on day {}", day_of_year))?;

        if day % interval == 0 {
            let w = weather.borrow();
            println!(
                "Day {:3}  radn {:5.1} MJ/m2  Tmax {:4.1}  rain {:4.1} mm  canopy {:5.0} mm  [{}]",
                day_of_year,
                w.radn,
                w.max_t,
                w.rain,
                model.canopy_height(),
                match model.strategy() {
                    ShortwaveStrategy::Layered => "layered",
                    ShortwaveStrategy::Row { geometry, .. } => geometry.name(),
                }
            );
            for zone in model.zones() {
                println!(
                    "    {:<10} layers {}  Rs {:6.2}  surface {:6.2}  Rn {:6.2}  PET {:5.2} mm  dry {:4.2}  Eo {}",
                    zone.name(),
                    zone.num_layers(),
                    zone.radiation_interception(),
                    zone.surface_radiation(),
                    zone.net_radiation(),
                    zone.pet_total(),
                    zone.dry_leaf_fraction(),
                    zone.soil_evaporation()
                        .map_or_else(|| "-".to_string(), |eo| format!("{:.2} mm", eo))
                );
            }
        }
    }

    println!("\n=== Done ===");
    Ok(())
}
