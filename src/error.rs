use crate::simulation::VehicleId;

/// Recoverable errors raised while building or stepping a scenario.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum HighwayError {
    #[error("cannot split {count} vehicles into {bins} groups")]
    InvalidSplit { count: usize, bins: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unknown vehicle {0:?}")]
    UnknownVehicle(VehicleId),
    #[error("environment must be reset before stepping")]
    NotReset,
}

pub type Result<T> = std::result::Result<T, HighwayError>;
