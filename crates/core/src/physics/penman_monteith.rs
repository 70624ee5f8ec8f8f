//! Penman-Monteith water demand, decoupling and soil evaporation
//!
//! Three temperature weightings are in use and each is tied to its
//! calibration: the demand terms use `0.75·max + 0.25·min`, the decoupling
//! coefficient uses the plain mean, and soil evaporation uses
//! `0.6·max + 0.4·min`.
//!
//! # References
//! - Monteith, J.L. (1965). "Evaporation and environment". Symposia of the
//!   Society for Experimental Biology, 19, 205-234
//! - Jarvis, P.G. & McNaughton, K.G. (1986). "Stomatal control of
//!   transpiration: scaling up from leaf to region". Advances in Ecological
//!   Research, 15, 1-49
//! - Ritchie, J.T. (1972). "Model for predicting evaporation from a row crop
//!   with incomplete cover". Water Resources Research, 8, 1204-1213

use crate::core_types::WeatherSnapshot;
use crate::physics::constants::{divide, PhysicalConstants, HR2S, J_PER_MJ};
use crate::physics::layers::CanopyState;

/// Saturated vapour pressure (hPa), Teten formula
#[inline]
pub fn saturated_vapour_pressure(temperature: f64, c: &PhysicalConstants) -> f64 {
    c.svp_a * (c.svp_b * temperature / (temperature + c.svp_c)).exp()
}

/// Latent heat of vaporisation of water (J/kg)
#[inline]
pub fn latent_heat(temperature: f64) -> f64 {
    (2501.0 - 2.38 * temperature) * 1000.0
}

/// Density of air (kg/m³)
pub fn air_density(temperature: f64, air_pressure: f64, c: &PhysicalConstants) -> f64 {
    // Pressure in Pa
    divide(
        c.mwair * air_pressure * 100.0,
        (c.abs_temp + temperature) * c.r_gas,
        0.0,
    )
}

/// Dimensionless slope of the saturated specific humidity curve, `λ/cp·dqs/dT`
pub fn humidity_slope(temperature: f64, air_pressure: f64, c: &PhysicalConstants) -> f64 {
    let esat = saturated_vapour_pressure(temperature, c);
    let desdt = esat * c.svp_b * c.svp_c / (c.svp_c + temperature).powi(2);
    let dqsdt = c.molef() * desdt / air_pressure;
    latent_heat(temperature) / c.cp * dqsdt
}

/// Daily vapour pressure deficit (hPa), weighted towards the deficit at the
/// maximum temperature
pub fn vapour_pressure_deficit(weather: &WeatherSnapshot, c: &PhysicalConstants) -> f64 {
    let at_min = (saturated_vapour_pressure(weather.min_t, c) - weather.vp).max(0.0);
    let at_max = (saturated_vapour_pressure(weather.max_t, c) - weather.vp).max(0.0);
    c.svp_fract * at_max + (1.0 - c.svp_fract) * at_min
}

/// Specific humidity deficit (kg/kg)
pub fn specific_vpd(weather: &WeatherSnapshot, c: &PhysicalConstants) -> f64 {
    c.molef() * vapour_pressure_deficit(weather, c) / weather.air_pressure
}

/// Radiation and aerodynamic terms of the Penman-Monteith equation (mm)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PetTerms {
    pub radiation: f64,
    pub aerodynamic: f64,
}

impl PetTerms {
    #[inline]
    pub fn total(&self) -> f64 {
        self.radiation + self.aerodynamic
    }
}

/// Penman-Monteith demand for one element.
///
/// # Arguments
/// * `net_radiation` - Net radiation driving the radiation term (J/m²)
/// * `day_length` - Hours over which the aerodynamic term acts
/// * `ga` - Aerodynamic conductance (m/s)
/// * `gc` - Canopy conductance (m/s)
pub fn penman_monteith(
    net_radiation: f64,
    day_length: f64,
    ga: f64,
    gc: f64,
    weather: &WeatherSnapshot,
    c: &PhysicalConstants,
) -> PetTerms {
    let t = weather.day_weighted_temperature();
    let slope = humidity_slope(t, weather.air_pressure, c);
    let denominator = slope + divide(ga, gc, 0.0) + 1.0;
    let radiation = divide(slope * net_radiation, denominator, 0.0) * 1000.0 / latent_heat(t) / c.rho_w;
    let aerodynamic = divide(
        air_density(t, weather.air_pressure, c) * specific_vpd(weather, c) * ga,
        denominator,
        0.0,
    ) * 1000.0
        * (day_length * HR2S)
        / c.rho_w;
    PetTerms {
        radiation,
        aerodynamic,
    }
}

/// Jarvis-McNaughton decoupling coefficient (0-1); near one when transpiration
/// is controlled by radiation, near zero when controlled by the air
pub fn omega(ga: f64, gc: f64, weather: &WeatherSnapshot, c: &PhysicalConstants) -> f64 {
    let slope = humidity_slope(weather.mean_temperature(), weather.air_pressure, c);
    divide(slope + 1.0, slope + 1.0 + divide(ga, gc, 0.0), 0.0)
}

/// Element net radiation (J/m²), never negative
#[inline]
fn element_net_radiation(albedo: f64, rs: f64, rl: f64, rsoil: f64) -> f64 {
    (J_PER_MJ * ((1.0 - albedo) * rs + rl + rsoil)).max(0.0)
}

/// Fraction of the day with dry leaves.
///
/// Intercepted rain that does not evaporate at night evaporates first at the
/// free-water rate of the canopy (canopy conductance treated as infinite).
pub fn dry_leaf_fraction(
    canopies: &[CanopyState],
    albedo: f64,
    sum_rs: f64,
    day_length_evap: f64,
    night_interception_fraction: f64,
    weather: &WeatherSnapshot,
    c: &PhysicalConstants,
) -> f64 {
    let (mut sum_rl, mut sum_rsoil, mut sum_interception, mut free_evap_ga) = (0.0, 0.0, 0.0, 0.0);
    for canopy in canopies {
        sum_rl += canopy.rl.iter().sum::<f64>();
        sum_rsoil += canopy.rsoil.iter().sum::<f64>();
        sum_interception += canopy.interception.iter().sum::<f64>();
        free_evap_ga += canopy.ga.iter().sum::<f64>();
    }

    let net_radiation = element_net_radiation(albedo, sum_rs, sum_rl, sum_rsoil);
    let free_evap_gc = free_evap_ga * 1e6;
    let free_evap = penman_monteith(
        net_radiation,
        day_length_evap,
        free_evap_ga,
        free_evap_gc,
        weather,
        c,
    )
    .total();
    let wet = divide(
        sum_interception * (1.0 - night_interception_fraction),
        free_evap,
        0.0,
    );
    (1.0 - wet).max(0.0)
}

/// Fill `petr`, `peta` and `pet` of every canopy layer. The radiation term is
/// reduced by the dry-leaf fraction of the radiation and the aerodynamic term
/// acts only over the dry part of the evaporative day.
pub fn calculate_pet(
    canopies: &mut [CanopyState],
    albedo: f64,
    dry_leaf_fraction: f64,
    day_length_evap: f64,
    weather: &WeatherSnapshot,
    c: &PhysicalConstants,
) {
    for canopy in canopies.iter_mut() {
        for i in 0..canopy.rs.len() {
            let rn = element_net_radiation(albedo, canopy.rs[i], canopy.rl[i], canopy.rsoil[i]);
            let radiation = penman_monteith(
                rn * dry_leaf_fraction,
                0.0,
                canopy.ga[i],
                canopy.gc[i],
                weather,
                c,
            )
            .radiation;
            let aerodynamic = penman_monteith(
                0.0,
                day_length_evap * dry_leaf_fraction,
                canopy.ga[i],
                canopy.gc[i],
                weather,
                c,
            )
            .aerodynamic;
            canopy.petr[i] = radiation;
            canopy.peta[i] = aerodynamic;
            canopy.pet[i] = radiation + aerodynamic;
        }
    }
}

/// Fill `omega` of every canopy layer
pub fn calculate_omega(canopies: &mut [CanopyState], weather: &WeatherSnapshot, c: &PhysicalConstants) {
    for canopy in canopies.iter_mut() {
        for i in 0..canopy.omega.len() {
            canopy.omega[i] = omega(canopy.ga[i], canopy.gc[i], weather, c);
        }
    }
}

/// Ratio of potential to equilibrium evaporation
pub fn equilibrium_evaporation_factor(max_t: f64, c: &PhysicalConstants) -> f64 {
    if max_t > c.max_crit_temp {
        // Hot days lift the ratio above its normal 1.1
        (max_t - c.max_crit_temp) * 0.05 + 1.1
    } else if max_t < c.min_crit_temp {
        // Discontinuous with the normal range at the lower threshold
        0.01 * (0.18 * (max_t + 20.0)).exp()
    } else {
        1.1
    }
}

/// Potential evaporation from the soil surface (mm), Priestley-Taylor style
/// equilibrium evaporation.
///
/// # Arguments
/// * `soil_albedo` - Bare soil albedo; residue does not change the surface
///   albedo in this formulation
/// * `cover_green` - Combined green cover of all canopies (0-1)
pub fn soil_potential_evaporation(
    weather: &WeatherSnapshot,
    soil_albedo: f64,
    cover_green: f64,
    c: &PhysicalConstants,
) -> f64 {
    let albedo = c.max_albedo - (c.max_albedo - soil_albedo) * (1.0 - cover_green);
    let t = weather.soil_weighted_temperature();
    let eeq = weather.radn * 23.8846 * (0.000204 - 0.000183 * albedo) * (t + 29.0);
    eeq * equilibrium_evaporation_factor(weather.max_t, c)
}
