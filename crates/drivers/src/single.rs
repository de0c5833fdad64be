//! The trivial driver: one zone, no coupling.

use tandem_core::{DriverKind, Integration, Zone, ZoneId, ZoneSet};
use thiserror::Error;

use crate::step::step_zone;
use crate::{Driver, StepReport, ZoneError};

/// Errors that can occur in the single-zone driver.
#[derive(Debug, Error)]
pub enum Error {
    #[error("single-zone driver needs exactly 1 zone, got {0}")]
    ZoneCount(usize),

    #[error(transparent)]
    Zone(#[from] ZoneError),
}

/// Advances a single zone: preprocess, advance, update.
#[derive(Debug)]
pub struct SingleZoneDriver<I: Integration> {
    zones: ZoneSet<I>,
}

impl<I: Integration> SingleZoneDriver<I> {
    /// Creates the driver.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZoneCount`] unless `zones` holds exactly one zone.
    pub fn new(zones: ZoneSet<I>) -> Result<Self, Error> {
        if zones.len() != 1 {
            return Err(Error::ZoneCount(zones.len()));
        }
        Ok(Self { zones })
    }

    #[must_use]
    pub fn zone(&self) -> &Zone<I> {
        &self.zones[ZoneId(0)]
    }

    pub fn zone_mut(&mut self) -> &mut Zone<I> {
        &mut self.zones[ZoneId(0)]
    }

    #[must_use]
    pub fn into_zones(self) -> ZoneSet<I> {
        self.zones
    }
}

impl<I: Integration> Driver for SingleZoneDriver<I> {
    type Report = StepReport;
    type Error = Error;

    fn kind(&self) -> DriverKind {
        DriverKind::Single
    }

    fn n_zones(&self) -> usize {
        1
    }

    #[tracing::instrument(name = "single_zone", skip(self))]
    fn run(&mut self, step: usize) -> Result<StepReport, Error> {
        let residual = step_zone(self.zone_mut(), step)?;
        Ok(StepReport {
            step,
            residuals: vec![residual],
        })
    }
}
