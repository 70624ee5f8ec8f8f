//! Error type for the micro-climate engine
//!
//! Every variant is fatal for the simulated day: it signals an invalid physical
//! configuration or a numerical breakdown, never a transient condition.

use thiserror::Error;

/// Errors raised while building or running the micro-climate model
#[derive(Error, Debug)]
pub enum MicroClimateError {
    /// A zone lacks a collaborator the energy balance cannot run without
    #[error("Zone '{zone}' has no {collaborator}; the micro-climate model requires one")]
    MissingCollaborator {
        zone: String,
        collaborator: &'static str,
    },

    /// Weather instrument height outside the supported range
    #[error("Reference height {0} m is outside the supported range [1, 10] m")]
    ReferenceHeightOutOfRange(f64),

    /// A configuration value failed validation
    #[error("Invalid micro-climate configuration: {0}")]
    InvalidConfig(String),

    /// Configuration text could not be parsed
    #[error("Failed to parse micro-climate configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A rectangular zone with a width that cannot be partitioned
    #[error("Zone '{zone}' has invalid rectangular width {width} m")]
    InvalidZoneGeometry { zone: String, width: f64 },

    /// Cover so close to 1 that the extinction coefficient is undefined
    #[error("Unrealistically high cover value {cover} for canopy '{canopy}' (must be < 0.999999999)")]
    UnrealisticCover { canopy: String, cover: f64 },

    /// NaN or infinity appeared in a top-down radiation sweep
    #[error("Bad radiation value in light partitioning for zone '{zone}' at layer {layer}")]
    NonFiniteRadiation { zone: String, layer: usize },

    /// Light fractions of a row geometry model do not add up to one
    #[error("Energy balance not maintained in {model} light interception model (fractions sum to {sum})")]
    EnergyBalanceNotMaintained { model: &'static str, sum: f64 },

    /// Alley canopy reaches into the tree crown where no vertical overlap is assumed
    #[error("Height of the alley canopy ({alley_height} m) must not exceed the base height of the tree canopy ({tree_base} m)")]
    AlleyCanopyTooTall { alley_height: f64, tree_base: f64 },

    /// More than one canopy in the row zone claims to be the tree crown
    #[error("Zone '{zone}' has more than one tree canopy")]
    MultipleTreeCanopies { zone: String },
}

/// Convenience type for `Result<T, MicroClimateError>`.
pub type Result<T> = std::result::Result<T, MicroClimateError>;
