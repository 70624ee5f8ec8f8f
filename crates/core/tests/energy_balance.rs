//! End-to-end energy balance of single-zone paddocks
//!
//! Runs the full daily pipeline through `MicroClimate` and checks the
//! conservation and consistency properties the zone outputs must satisfy.

use approx::assert_relative_eq;
use micromet_core::{
    CanopyDescriptor, MicroClimate, MicroClimateConfig, MicroClimateError, StaticResidue,
    StaticSoil, WeatherSnapshot, ZoneDefinition, ZoneGeometry,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn paddock(canopies: Vec<CanopyDescriptor>) -> ZoneDefinition {
    canopies.into_iter().fold(
        ZoneDefinition::new("paddock", ZoneGeometry::Unbounded)
            .with_soil_water(Rc::new(StaticSoil { albedo: 0.13 })),
        |zone, canopy| zone.with_canopy(Rc::new(canopy)),
    )
}

fn run(canopies: Vec<CanopyDescriptor>, weather: WeatherSnapshot) -> Result<MicroClimate, MicroClimateError> {
    let mut model = MicroClimate::new(
        MicroClimateConfig::default(),
        Rc::new(weather),
        Rc::new(172_u32),
        paddock(canopies),
        Vec::new(),
    )?;
    model.do_energy_arbitration()?;
    Ok(model)
}

fn scenario_canopy() -> CanopyDescriptor {
    CanopyDescriptor::new("wheat", 1000.0, 1000.0)
        .with_lai(2.0, 2.4)
        .with_cover(0.5, 0.6)
}

#[test]
fn test_single_canopy_scenario() {
    let model = run(vec![scenario_canopy()], WeatherSnapshot::default()).unwrap();
    let zone = model.primary_zone();

    assert_eq!(zone.num_layers(), 1);
    let canopy = &zone.canopies()[0];
    assert_relative_eq!(canopy.k, 0.34657, epsilon = 1e-5);
    assert_relative_eq!(canopy.ktot, -(0.4_f64.ln()) / 2.4, epsilon = 1e-12);
    assert_relative_eq!(canopy.ktot, 0.3818, epsilon = 1e-4);

    let expected = 20.0 * (1.0 - (-canopy.ktot * 2.4).exp());
    assert_relative_eq!(zone.radiation_interception(), expected, epsilon = 1e-9);
    assert_relative_eq!(zone.radiation_interception(), 12.0, epsilon = 1e-9);
    assert_relative_eq!(zone.surface_radiation(), 8.0, epsilon = 1e-9);
    assert_relative_eq!(model.canopy_cover(), 0.6, epsilon = 1e-9);
    assert_eq!(model.canopy_height(), 1000.0);
}

#[test]
fn test_leaf_area_shares_sum_to_one() {
    let canopies = vec![
        CanopyDescriptor::new("maize", 2400.0, 1800.0)
            .with_lai(3.0, 3.5)
            .with_cover(0.7, 0.75),
        CanopyDescriptor::new("bean", 900.0, 900.0)
            .with_lai(1.5, 1.6)
            .with_cover(0.5, 0.52),
        CanopyDescriptor::new("weeds", 300.0, 300.0)
            .with_lai(0.4, 0.5)
            .with_cover(0.2, 0.25),
    ];
    let model = run(canopies, WeatherSnapshot::default()).unwrap();
    let zone = model.primary_zone();

    for i in 0..zone.num_layers() {
        if zone.layers().lai_tot_sum[i] > 0.0 {
            let sum: f64 = zone.canopies().iter().map(|c| c.ftot[i]).sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-9);
        }
    }
    assert_relative_eq!(zone.layers().total_height(), 2.4, epsilon = 1e-12);
    assert_relative_eq!(zone.layers().total_lai(), 3.5 + 1.6 + 0.5, epsilon = 1e-9);
}

/// A random canopy, sometimes in the emerging-crop corner of the input space:
/// near-zero cover, tiny leaf area, or a top a few micrometres from `near`.
fn random_canopy(rng: &mut StdRng, name: String, near: Option<f64>) -> CanopyDescriptor {
    let height = match near {
        Some(h) if rng.random_bool(0.5) => h + rng.random_range(0.0..0.01),
        _ => rng.random_range(100.0..3000.0),
    };
    let depth = rng.random_range(0.5..=1.0) * height;
    let (lai_total, cover_total) = match rng.random_range(0..4) {
        0 => (rng.random_range(0.1..6.0), rng.random_range(1e-8..1e-4)),
        1 => (rng.random_range(1e-7..1e-3), rng.random_range(1e-6..0.05)),
        _ => (rng.random_range(0.1..6.0), rng.random_range(0.05..0.95)),
    };
    let lai = lai_total * rng.random_range(0.2..=1.0);
    let cover_green = cover_total * rng.random_range(0.2..=1.0);
    CanopyDescriptor::new(name, height, depth)
        .with_lai(lai, lai_total)
        .with_cover(cover_green, cover_total)
}

#[test]
fn test_randomised_canopies_conserve_shortwave() {
    let mut rng = StdRng::seed_from_u64(20_240_601);
    for _ in 0..200 {
        let count = rng.random_range(1..=4);
        let mut canopies: Vec<CanopyDescriptor> = Vec::with_capacity(count);
        for i in 0..count {
            let near = canopies.last().map(|c| *c.height);
            canopies.push(random_canopy(&mut rng, format!("c{i}"), near));
        }
        let weather = WeatherSnapshot {
            radn: rng.random_range(1.0..35.0),
            ..WeatherSnapshot::default()
        };
        let model = run(canopies, weather).unwrap();
        let zone = model.primary_zone();
        assert_relative_eq!(
            zone.radiation_interception() + zone.surface_radiation(),
            weather.radn,
            max_relative = 1e-9
        );
        assert_relative_eq!(
            zone.pet_total(),
            zone.pet_radiation_term() + zone.pet_aerodynamic_term(),
            max_relative = 1e-9
        );
        for i in 0..zone.num_layers() {
            if zone.layers().lai_tot_sum[i] > 0.0 {
                let sum: f64 = zone.canopies().iter().map(|c| c.ftot[i]).sum();
                assert_relative_eq!(sum, 1.0, epsilon = 1e-9);
            }
        }
        for canopy in zone.canopies() {
            assert!(canopy.omega.iter().all(|&o| (0.0..=1.0).contains(&o)));
            assert!(canopy.gc.iter().all(|&g| g >= 0.0001));
        }
    }
}

#[test]
fn test_bare_paddock() {
    let model = run(Vec::new(), WeatherSnapshot::default()).unwrap();
    let zone = model.primary_zone();
    assert_eq!(zone.num_layers(), 0);
    assert_eq!(zone.surface_radiation(), 20.0);
    assert_eq!(zone.radiation_interception(), 0.0);
    assert_eq!(zone.pet_total(), 0.0);
    assert_relative_eq!(zone.aggregate().albedo, 0.13, epsilon = 1e-12);
    // Bare soil heat flux is limited to a tenth of radiation
    assert_relative_eq!(zone.soil_heat_flux(), -2.0, epsilon = 1e-12);
}

#[test]
fn test_unrealistic_cover_is_fatal() {
    let canopy = CanopyDescriptor::new("lawn", 100.0, 100.0)
        .with_lai(5.0, 5.0)
        .with_cover(0.9999999999, 0.9999999999);
    let err = run(vec![canopy], WeatherSnapshot::default()).unwrap_err();
    assert!(matches!(err, MicroClimateError::UnrealisticCover { ref canopy, .. } if canopy == "lawn"));
}

#[test]
fn test_identical_inputs_give_identical_outputs() {
    let canopies = || {
        vec![
            CanopyDescriptor::new("oats", 1100.0, 900.0)
                .with_lai(2.5, 3.0)
                .with_cover(0.6, 0.65),
            CanopyDescriptor::new("vetch", 600.0, 600.0)
                .with_lai(1.0, 1.2)
                .with_cover(0.4, 0.45),
        ]
    };
    let a = run(canopies(), WeatherSnapshot::default()).unwrap();
    let b = run(canopies(), WeatherSnapshot::default()).unwrap();
    assert_eq!(a.primary_zone().layers(), b.primary_zone().layers());
    assert_eq!(a.primary_zone().canopies(), b.primary_zone().canopies());
    assert_eq!(a.primary_zone().aggregate(), b.primary_zone().aggregate());
}

#[test]
fn test_repeated_days_reuse_state() {
    let crop = Rc::new(RefCell::new(scenario_canopy()));
    let weather = Rc::new(RefCell::new(WeatherSnapshot::default()));
    let clock = Rc::new(Cell::new(100_u32));
    let mut model = MicroClimate::new(
        MicroClimateConfig::default(),
        weather.clone(),
        clock.clone(),
        ZoneDefinition::new("paddock", ZoneGeometry::Unbounded)
            .with_soil_water(Rc::new(StaticSoil { albedo: 0.13 }))
            .with_canopy(crop.clone()),
        Vec::new(),
    )
    .unwrap();

    model.do_energy_arbitration().unwrap();
    let first = model.radiation_interception();

    // Same inputs on a later day give the same shortwave split
    clock.set(101);
    model.do_energy_arbitration().unwrap();
    assert_eq!(model.radiation_interception(), first);

    // A denser canopy intercepts more
    crop.borrow_mut().lai_total = 4.0;
    crop.borrow_mut().lai = 3.5;
    crop.borrow_mut().cover_green = 0.8;
    crop.borrow_mut().cover_total = 0.85;
    weather.borrow_mut().radn = 25.0;
    model.do_energy_arbitration().unwrap();
    assert!(model.radiation_interception() > first);
    assert_relative_eq!(
        model.radiation_interception() + model.primary_zone().surface_radiation(),
        25.0,
        epsilon = 1e-9
    );
}

#[test]
fn test_wet_canopy_reduces_dry_leaf_fraction() {
    let config = MicroClimateConfig::from_toml_str(
        r#"
        [interception]
        a = 0.0
        b = 1.0
        c = 0.5
        d = 0.0
        "#,
    )
    .unwrap();
    let rainy = WeatherSnapshot {
        rain: 20.0,
        radn: 8.0,
        ..WeatherSnapshot::default()
    };
    let mut model = MicroClimate::new(
        config,
        Rc::new(rainy),
        Rc::new(200_u32),
        paddock(vec![scenario_canopy()]),
        Vec::new(),
    )
    .unwrap();
    model.do_energy_arbitration().unwrap();
    let zone = model.primary_zone();

    assert_relative_eq!(zone.precipitation_interception(), 1.2, epsilon = 1e-9);
    assert_relative_eq!(zone.potential_infiltration(), 18.8, epsilon = 1e-9);
    assert!(zone.dry_leaf_fraction() < 1.0);

    let dry = run(vec![scenario_canopy()], WeatherSnapshot { radn: 8.0, ..WeatherSnapshot::default() }).unwrap();
    assert_eq!(dry.primary_zone().dry_leaf_fraction(), 1.0);
    assert!(zone.pet_total() < dry.primary_zone().pet_total());
}

#[test]
fn test_soil_evaporation_needs_residue_model() {
    let with_residue = paddock(vec![scenario_canopy()])
        .with_surface_residue(Rc::new(StaticResidue { cover: 0.2 }));
    let mut model = MicroClimate::new(
        MicroClimateConfig::default(),
        Rc::new(WeatherSnapshot::default()),
        Rc::new(200_u32),
        with_residue,
        Vec::new(),
    )
    .unwrap();
    model.do_energy_arbitration().unwrap();
    assert!(model.primary_zone().soil_evaporation().is_some_and(|eo| eo > 0.0));

    let without = run(vec![scenario_canopy()], WeatherSnapshot::default()).unwrap();
    assert_eq!(without.primary_zone().soil_evaporation(), None);
}

#[test]
fn test_missing_soil_water_model() {
    let err = MicroClimate::new(
        MicroClimateConfig::default(),
        Rc::new(WeatherSnapshot::default()),
        Rc::new(1_u32),
        ZoneDefinition::new("paddock", ZoneGeometry::Unbounded),
        Vec::new(),
    )
    .unwrap_err();
    assert!(matches!(err, MicroClimateError::MissingCollaborator { .. }));
}

#[test]
fn test_reference_height_out_of_range() {
    let config = MicroClimateConfig {
        reference_height: 12.0,
        ..MicroClimateConfig::default()
    };
    let err = MicroClimate::new(
        config,
        Rc::new(WeatherSnapshot::default()),
        Rc::new(1_u32),
        paddock(Vec::new()),
        Vec::new(),
    )
    .unwrap_err();
    assert!(matches!(err, MicroClimateError::ReferenceHeightOutOfRange(h) if h == 12.0));
}

#[test]
fn test_polar_winter_floors_evaporative_day() {
    let weather = WeatherSnapshot {
        latitude: -60.0,
        radn: 2.0,
        ..WeatherSnapshot::default()
    };
    let mut model = MicroClimate::new(
        MicroClimateConfig::default(),
        Rc::new(weather),
        Rc::new(172_u32),
        paddock(vec![scenario_canopy()]),
        Vec::new(),
    )
    .unwrap();
    model.do_energy_arbitration().unwrap();
    let dl = model.day_lengths();
    assert!(dl.evaporative_floored);
    assert_relative_eq!(dl.evaporative, dl.light * 2.0 / 3.0, epsilon = 1e-12);
}
