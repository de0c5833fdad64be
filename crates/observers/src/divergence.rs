use tandem_core::Observer;

use crate::traits::{CanStopEarly, HasResidual};

/// Stops a coupling loop that is clearly not converging.
///
/// The guard tracks the smallest residual seen. It requests a stop when the
/// residual becomes non-finite, or when it has stayed above
/// `growth × best` for `patience` consecutive iterations.
#[derive(Debug, Clone, PartialEq)]
pub struct DivergenceGuard {
    growth: f64,
    patience: usize,
    best: f64,
    strikes: usize,
    tripped: bool,
}

impl DivergenceGuard {
    /// Creates a guard.
    ///
    /// `growth` below one is treated as one.
    #[must_use]
    pub fn new(growth: f64, patience: usize) -> Self {
        Self {
            growth: growth.max(1.0),
            patience: patience.max(1),
            best: f64::INFINITY,
            strikes: 0,
            tripped: false,
        }
    }

    /// Returns `true` if the guard has requested a stop.
    #[must_use]
    pub fn tripped(&self) -> bool {
        self.tripped
    }

    /// Forgets the residuals seen so far, e.g. at the start of a new step.
    pub fn reset(&mut self) {
        self.best = f64::INFINITY;
        self.strikes = 0;
        self.tripped = false;
    }

    fn check(&mut self, residual: f64) -> bool {
        if !residual.is_finite() {
            self.tripped = true;
            return true;
        }

        if residual < self.best {
            self.best = residual;
            self.strikes = 0;
        } else if residual > self.growth * self.best {
            self.strikes += 1;
        }

        if self.strikes >= self.patience {
            tracing::warn!(residual, best = self.best, "residual diverging, stopping");
            self.tripped = true;
        }
        self.tripped
    }
}

impl Default for DivergenceGuard {
    fn default() -> Self {
        Self::new(10.0, 3)
    }
}

impl<E: HasResidual, A: CanStopEarly> Observer<E, A> for DivergenceGuard {
    fn observe(&mut self, event: &E) -> Option<A> {
        self.check(event.residual()).then(A::stop_early)
    }
}

impl<E: HasResidual, A: CanStopEarly> Observer<E, A> for &mut DivergenceGuard {
    fn observe(&mut self, event: &E) -> Option<A> {
        (**self).observe(event)
    }
}
