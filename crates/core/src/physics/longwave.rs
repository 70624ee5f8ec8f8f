//! Day length, sunshine hours and net long wave radiation
//!
//! # References
//! - Swinbank, W.C. (1963). "Long-wave radiation from clear skies"
//!   Quarterly Journal of the Royal Meteorological Society, 89, 339-348
//! - Allen, R.G. et al. (1998). FAO Irrigation and Drainage Paper 56,
//!   extraterrestrial radiation (Eq. 21)

use crate::physics::constants::{divide, PhysicalConstants, HR2S, J_PER_MJ};
use std::f64::consts::PI;

/// Hours between sunrise and sunset for a given sun elevation.
///
/// The sun elevation is the angle above the horizon that counts as "up", so
/// 0° gives the light period and larger angles give shorter periods. Polar
/// day and night give 24 and 0 hours.
///
/// # Arguments
/// * `day_of_year` - Day of year (1-366)
/// * `sun_angle` - Sun elevation defining sunrise and sunset (degrees)
/// * `latitude` - Latitude (degrees, south negative)
///
/// # Returns
/// Day length (hours)
pub fn day_length(day_of_year: u32, sun_angle: f64, latitude: f64) -> f64 {
    // Day number of the autumnal equinox and solar declination amplitude
    const AUTUMNAL_EQUINOX: f64 = 79.25;
    const DECLINATION_AMPLITUDE: f64 = 23.45116;
    let days_to_rad = 2.0 * PI / 365.25;
    let rad_to_hours = 24.0 / (2.0 * PI);

    let declination = DECLINATION_AMPLITUDE.to_radians()
        * (days_to_rad * (f64::from(day_of_year) - AUTUMNAL_EQUINOX)).sin();

    let cos_hour_angle = if (latitude.abs() - 90.0).abs() < 1e-5 {
        // At the poles the sun is either always up or always down
        let sign = |v: f64| if v >= 0.0 { 1.0 } else { -1.0 };
        sign(-declination) * sign(latitude)
    } else {
        let lat = latitude.to_radians();
        let sin_sin = lat.sin() * declination.sin();
        let cos_cos = lat.cos() * declination.cos();
        let lowest = (sin_sin - cos_cos).clamp(-1.0, 1.0).asin();
        let highest = (sin_sin + cos_cos).clamp(-1.0, 1.0).asin();
        let altitude = sun_angle.to_radians().max(lowest).min(highest);
        ((altitude.sin() - sin_sin) / cos_cos).clamp(-1.0, 1.0)
    };

    cos_hour_angle.acos() * rad_to_hours * 2.0
}

/// Light and evaporative day lengths for a day
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DayLengths {
    /// Hours with the sun above the horizon
    pub light: f64,
    /// Hours with positive net radiation
    pub evaporative: f64,
    /// Whether the evaporative period was raised to its floor
    pub evaporative_floored: bool,
}

/// Compute the light and evaporative day lengths.
///
/// The evaporative period is floored at two thirds of the light period, which
/// keeps high latitudes from having no evaporative period in winter.
pub fn day_lengths(day_of_year: u32, latitude: f64, constants: &PhysicalConstants) -> DayLengths {
    let light = day_length(day_of_year, constants.sun_set_angle, latitude);
    let raw = day_length(
        day_of_year,
        constants.sun_angle_net_positive_radiation,
        latitude,
    );
    let floor = light * 2.0 / 3.0;
    DayLengths {
        light,
        evaporative: raw.max(floor),
        evaporative_floored: raw < floor,
    }
}

/// Bright sunshine hours estimated from the ratio of measured radiation to
/// the clear-sky maximum.
///
/// # Arguments
/// * `radn` - Measured radiation (MJ/m²)
/// * `day_length_light` - Light day length (hours)
/// * `latitude` - Latitude (degrees)
/// * `day_of_year` - Day of year
///
/// # Returns
/// Sunshine hours, never more than the day length
pub fn sunshine_hours(radn: f64, day_length_light: f64, latitude: f64, day_of_year: u32) -> f64 {
    let day = f64::from(day_of_year);
    let lat = latitude.to_radians();
    let relative_distance = 1.0 + 0.033 * (0.0172 * day).cos();
    let declination = 0.409 * (0.0172 * day - 1.39).sin();
    // Clamped so polar day and night give a 0 or π sunset angle instead of NaN
    let sunset_angle = (-lat.tan() * declination.tan()).clamp(-1.0, 1.0).acos();
    let extraterrestrial = 37.6
        * relative_distance
        * (sunset_angle * lat.sin() * declination.sin()
            + lat.cos() * declination.cos() * sunset_angle.sin());
    let clear_sky = 0.75 * extraterrestrial;
    (day_length_light * radn / clear_sky).min(day_length_light)
}

/// Fraction of the light period with clear sky (0-1)
pub fn fraction_clear_sky(
    radn: f64,
    day_length_light: f64,
    latitude: f64,
    day_of_year: u32,
) -> f64 {
    let hours = sunshine_hours(radn, day_length_light, latitude, day_of_year);
    divide(hours, day_length_light, 0.0).clamp(0.0, 1.0)
}

/// Net long wave radiation into the surface (W/m²), negative when the surface
/// loses heat.
///
/// # Arguments
/// * `temperature` - Air temperature (°C)
/// * `fraction_clear_sky` - Clear-sky fraction (0-1)
/// * `emissivity` - Surface emissivity
pub fn net_long_wave(
    temperature: f64,
    fraction_clear_sky: f64,
    emissivity: f64,
    constants: &PhysicalConstants,
) -> f64 {
    let f = fraction_clear_sky.clamp(0.0, 1.0);
    let t_kelvin = temperature + constants.abs_temp;
    // Swinbank clear-sky emissivity
    let sky_emissivity = 9.37e-6 * t_kelvin.powi(2);
    let cloud_effect = constants.c_cloud + (1.0 - constants.c_cloud) * f;
    cloud_effect * (sky_emissivity - emissivity) * constants.stef_boltz * t_kelvin.powi(4)
}

/// Net long wave over the evaporative period (MJ/m²)
pub fn net_long_wave_daily(
    temperature: f64,
    fraction_clear_sky: f64,
    emissivity: f64,
    day_length_evap: f64,
    constants: &PhysicalConstants,
) -> f64 {
    net_long_wave(temperature, fraction_clear_sky, emissivity, constants) * day_length_evap * HR2S
        / J_PER_MJ
}
