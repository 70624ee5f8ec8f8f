//! Zone energy terms: albedo, emissivity and soil heat flux

use crate::physics::constants::{divide, PhysicalConstants};
use crate::physics::layers::CanopyState;

/// Radiative properties of a zone's surface as seen from above
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceProperties {
    /// Shortwave albedo of canopy and soil together
    pub albedo: f64,
    /// Long wave emissivity of canopy and soil together
    pub emissivity: f64,
    /// Shortwave intercepted by all canopies (MJ/m²)
    pub sum_rs: f64,
}

/// Weight canopy and soil albedo and emissivity by the share of incoming
/// shortwave each element intercepts; the soil takes the unintercepted share.
pub fn surface_properties(
    radn: f64,
    canopies: &[CanopyState],
    soil_albedo: f64,
    constants: &PhysicalConstants,
) -> SurfaceProperties {
    let mut props = SurfaceProperties::default();
    for canopy in canopies {
        for &rs in &canopy.rs {
            let share = divide(rs, radn, 0.0);
            props.albedo += share * canopy.descriptor.albedo;
            props.emissivity += share * constants.canopy_emissivity;
            props.sum_rs += rs;
        }
    }
    let soil_share = 1.0 - divide(props.sum_rs, radn, 0.0);
    props.albedo += soil_share * soil_albedo;
    props.emissivity += soil_share * constants.soil_emissivity;
    props
}

/// Daytime soil heat flux (MJ/m²), negative into the soil.
///
/// A fraction of the radiation not intercepted by the canopy heats the soil,
/// limited to a tenth of the incoming radiation.
///
/// # Arguments
/// * `radn` - Incoming shortwave (MJ/m²)
/// * `intercepted` - Shortwave intercepted by the canopy (MJ/m²)
/// * `fraction` - Fraction of radiation at the soil surface that heats the soil
pub fn soil_heat_flux(radn: f64, intercepted: f64, fraction: f64) -> f64 {
    (-fraction * (radn - intercepted)).min(0.0).max(-0.1 * radn)
}

/// Share a zone total among the layers of one canopy in proportion to the
/// shortwave each layer intercepts.
pub fn scale_by_shortwave(radn: f64, total: f64, rs: &[f64], out: &mut [f64]) {
    for (o, &r) in out.iter_mut().zip(rs) {
        *o = divide(r, radn, 0.0) * total;
    }
}
