use std::error::Error as StdError;

use tandem_core::ZoneId;

/// A failure reported by one of a zone's collaborators.
///
/// The source error is carried unchanged.
#[derive(Debug, thiserror::Error)]
#[error("zone {zone} failed: {source}")]
pub struct ZoneError {
    pub zone: ZoneId,

    #[source]
    pub source: Box<dyn StdError + Send + Sync>,
}

impl ZoneError {
    pub(crate) fn new<E: StdError + Send + Sync + 'static>(zone: ZoneId, err: E) -> Self {
        Self {
            zone,
            source: Box::new(err),
        }
    }
}
