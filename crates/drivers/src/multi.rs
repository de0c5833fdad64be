//! Independent zones advanced one after another.

use tandem_core::{DriverKind, Integration, ZoneSet};
use thiserror::Error;

use crate::step::step_zone;
use crate::{Driver, StepReport, ZoneError};

/// Errors that can occur in the multi-zone driver.
#[derive(Debug, Error)]
pub enum Error {
    #[error("multi-zone driver needs at least 1 zone")]
    NoZones,

    #[error(transparent)]
    Zone(#[from] ZoneError),
}

/// Advances every zone in index order with no exchange between zones.
#[derive(Debug)]
pub struct MultiZoneDriver<I: Integration> {
    zones: ZoneSet<I>,
}

impl<I: Integration> MultiZoneDriver<I> {
    /// Creates the driver.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoZones`] if `zones` is empty.
    pub fn new(zones: ZoneSet<I>) -> Result<Self, Error> {
        if zones.is_empty() {
            return Err(Error::NoZones);
        }
        Ok(Self { zones })
    }

    #[must_use]
    pub fn zones(&self) -> &ZoneSet<I> {
        &self.zones
    }

    pub fn zones_mut(&mut self) -> &mut ZoneSet<I> {
        &mut self.zones
    }

    #[must_use]
    pub fn into_zones(self) -> ZoneSet<I> {
        self.zones
    }
}

#[cfg(feature = "parallel")]
impl<I> MultiZoneDriver<I>
where
    I: Integration,
    tandem_core::Zone<I>: Send,
{
    /// Runs every zone's step concurrently on the rayon thread pool.
    ///
    /// Residuals are reported in zone-index order. If several zones fail,
    /// the error of the lowest-indexed failing zone is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Zone`] if any zone fails.
    #[tracing::instrument(name = "multi_zone_parallel", skip(self))]
    pub fn run_parallel(&mut self, step: usize) -> Result<StepReport, Error> {
        use rayon::prelude::*;

        let results: Vec<Result<f64, ZoneError>> = self
            .zones
            .par_iter_mut()
            .map(|zone| step_zone(zone, step))
            .collect();

        let residuals = results.into_iter().collect::<Result<Vec<_>, _>>()?;
        Ok(StepReport { step, residuals })
    }
}

impl<I: Integration> Driver for MultiZoneDriver<I> {
    type Report = StepReport;
    type Error = Error;

    fn kind(&self) -> DriverKind {
        DriverKind::Multi
    }

    fn n_zones(&self) -> usize {
        self.zones.len()
    }

    #[tracing::instrument(name = "multi_zone", skip(self))]
    fn run(&mut self, step: usize) -> Result<StepReport, Error> {
        let residuals = self
            .zones
            .iter_mut()
            .map(|zone| step_zone(zone, step))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(StepReport { step, residuals })
    }
}
