//! Minimal zones for unit tests.

use tandem_core::{Equation, Integration, Zone, ZoneConfig, ZoneId, ZoneSet};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tally {
    Preprocess(usize),
    Advance(usize),
    Update(usize),
}

#[derive(Debug, Error)]
#[error("blew up at step {0}")]
pub(crate) struct BlewUp(pub usize);

#[derive(Debug, Default)]
pub(crate) struct TallySolvers {
    pub fail_at: Option<usize>,
}

/// Records every hook call; advance returns `1 / (step + 1)`.
#[derive(Debug, Default)]
pub(crate) struct TallyIntegration {
    pub calls: Vec<Tally>,
}

impl Integration for TallyIntegration {
    type Geometry = ();
    type Solvers = TallySolvers;
    type Numerics = ();
    type Error = BlewUp;

    fn preprocess(
        &mut self,
        _: &mut (),
        _: &mut TallySolvers,
        _: &(),
        _: &ZoneConfig,
        step: usize,
    ) -> Result<(), BlewUp> {
        self.calls.push(Tally::Preprocess(step));
        Ok(())
    }

    fn advance(
        &mut self,
        _: &mut (),
        solvers: &mut TallySolvers,
        _: &(),
        _: &ZoneConfig,
        step: usize,
    ) -> Result<f64, BlewUp> {
        if solvers.fail_at == Some(step) {
            return Err(BlewUp(step));
        }
        self.calls.push(Tally::Advance(step));
        Ok(1.0 / (step + 1) as f64)
    }

    fn update(
        &mut self,
        _: &mut (),
        _: &mut TallySolvers,
        _: &(),
        _: &ZoneConfig,
        step: usize,
    ) -> Result<(), BlewUp> {
        self.calls.push(Tally::Update(step));
        Ok(())
    }
}

pub(crate) fn tally_zones(n: usize) -> ZoneSet<TallyIntegration> {
    let zones = (0..n)
        .map(|index| {
            Zone::new(
                ZoneId(index),
                ZoneConfig::new(vec![Equation::Flow]),
                (),
                TallySolvers::default(),
                TallyIntegration::default(),
                (),
            )
        })
        .collect();
    ZoneSet::new(zones).expect("contiguous ids")
}
