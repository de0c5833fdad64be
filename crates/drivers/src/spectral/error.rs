use tandem_core::{ConfigError, Equation, ZoneId};
use thiserror::Error;

use crate::ZoneError;

use super::linalg;

/// Errors that can occur in the spectral driver and operator builder.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("spectral driver needs at least 2 zones, got {0}")]
    ZoneCount(usize),

    #[error("zone {zone} requests grid movement but the driver has no moving-grid support")]
    GridMovement { zone: ZoneId },

    #[error("spectral operator is singular")]
    SingularOperator(#[source] linalg::Error),

    #[error("spectral operator construction failed: {0}")]
    Linalg(#[source] linalg::Error),

    #[error("operator has {expected} instances, got {found} signals")]
    InstanceCount { expected: usize, found: usize },

    #[error("row {row} is out of range for {n_instances} instances")]
    Row { row: usize, n_instances: usize },

    #[error("instance {instance} has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        instance: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("zone at position {position} carries id {found}")]
    ZoneOrder { position: usize, found: ZoneId },

    #[error("zone {zone} has no {equation:?} solution")]
    MissingSolution { zone: ZoneId, equation: Equation },

    #[error("zone {zone}: {equation:?} solution has shape {found:?}, expected {expected:?}")]
    SnapshotShape {
        zone: ZoneId,
        equation: Equation,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("zone {zone}: coordinates have shape {found:?}, expected {expected:?}")]
    CoordinateShape {
        zone: ZoneId,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error(transparent)]
    Zone(#[from] ZoneError),
}

impl From<linalg::Error> for Error {
    fn from(err: linalg::Error) -> Self {
        match err {
            linalg::Error::Singular { .. } => Self::SingularOperator(err),
            other => Self::Linalg(other),
        }
    }
}
