use tandem_core::{Integration, Zone};

use crate::ZoneError;

/// Runs the integration's preprocess and advance hooks for one zone.
pub(crate) fn advance_zone<I: Integration>(
    zone: &mut Zone<I>,
    step: usize,
) -> Result<f64, ZoneError> {
    let id = zone.id();
    zone.preprocess(step).map_err(|err| ZoneError::new(id, err))?;
    let residual = zone.advance(step).map_err(|err| ZoneError::new(id, err))?;
    tracing::debug!(zone = id.index(), step, residual, "advanced zone");
    Ok(residual)
}

pub(crate) fn update_zone<I: Integration>(zone: &mut Zone<I>, step: usize) -> Result<(), ZoneError> {
    let id = zone.id();
    zone.update(step).map_err(|err| ZoneError::new(id, err))
}

/// Runs a full preprocess, advance, update sequence for one zone.
pub(crate) fn step_zone<I: Integration>(zone: &mut Zone<I>, step: usize) -> Result<f64, ZoneError> {
    let residual = advance_zone(zone, step)?;
    update_zone(zone, step)?;
    Ok(residual)
}
