use std::error::Error as StdError;

use tandem_core::{ConfigError, ZoneId};

use crate::ZoneError;

/// Errors that can occur in the FSI driver.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{role} zone must have id {expected}, got {found}")]
    ZoneRole {
        role: &'static str,
        expected: ZoneId,
        found: ZoneId,
    },

    #[error("interface {quantity} has shape {found:?}, expected {expected:?}")]
    InterfaceShape {
        quantity: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("mesh deformation failed: {0}")]
    Deform(#[source] Box<dyn StdError + Send + Sync>),

    #[error(transparent)]
    Zone(#[from] ZoneError),
}

impl Error {
    pub(crate) fn deform<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Deform(Box::new(err))
    }
}
