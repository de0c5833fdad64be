use ndarray::Array2;
use tandem_core::{Equation, Integration, PreprocessError, SpectralState, ZoneId, ZoneSet};

use super::Error;

/// Snapshots are stored by position and read back by zone id.
pub(super) fn check_order<I: Integration>(zones: &ZoneSet<I>) -> Result<(), Error> {
    match zones.check_order() {
        Err(PreprocessError::ZoneOrder { position, found }) => {
            Err(Error::ZoneOrder { position, found })
        }
        _ => Ok(()),
    }
}

/// Owned copies of every instance's solution, one list per equation.
///
/// The history is captured before any source term is written, so every
/// instance sees the same pre-step state of every other instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolutionHistory {
    entries: Vec<(Equation, Vec<Array2<f64>>)>,
}

impl SolutionHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots the spectral equations of zone 0 across all zones.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZoneOrder`] if a zone has moved away from its index,
    /// [`Error::MissingSolution`] if a zone lacks an equation, and
    /// [`Error::SnapshotShape`] if a zone's solution differs in shape from
    /// zone 0's.
    pub fn capture<I>(zones: &ZoneSet<I>) -> Result<Self, Error>
    where
        I: Integration,
        I::Solvers: SpectralState,
    {
        check_order(zones)?;

        let mut history = Self::new();
        let Some(first) = zones.get(ZoneId(0)) else {
            return Ok(history);
        };

        for equation in first.config().spectral_equations() {
            let snapshots = zones
                .iter()
                .map(|zone| {
                    zone.solvers()
                        .solution(equation)
                        .map(|view| view.to_owned())
                        .ok_or(Error::MissingSolution {
                            zone: zone.id(),
                            equation,
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            history.insert(equation, snapshots)?;
        }

        Ok(history)
    }

    /// Adds the snapshots for `equation`, replacing any earlier entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SnapshotShape`] if the snapshots differ in shape.
    pub fn insert(&mut self, equation: Equation, snapshots: Vec<Array2<f64>>) -> Result<(), Error> {
        if let Some(first) = snapshots.first() {
            let expected = first.dim();
            if let Some((index, found)) = snapshots
                .iter()
                .map(Array2::dim)
                .enumerate()
                .find(|(_, dim)| *dim != expected)
            {
                return Err(Error::SnapshotShape {
                    zone: ZoneId(index),
                    equation,
                    expected,
                    found,
                });
            }
        }

        match self.entries.iter_mut().find(|(eq, _)| *eq == equation) {
            Some((_, existing)) => *existing = snapshots,
            None => self.entries.push((equation, snapshots)),
        }
        Ok(())
    }

    /// Returns the captured equations in capture order.
    pub fn equations(&self) -> impl Iterator<Item = Equation> + '_ {
        self.entries.iter().map(|(eq, _)| *eq)
    }

    /// Returns the snapshots of `equation`, indexed by zone.
    #[must_use]
    pub fn snapshots(&self, equation: Equation) -> Option<&[Array2<f64>]> {
        self.entries
            .iter()
            .find(|(eq, _)| *eq == equation)
            .map(|(_, snapshots)| snapshots.as_slice())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
