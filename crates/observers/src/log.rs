use tandem_core::Observer;
use tracing::Level;

use crate::traits::{HasIteration, HasResidual};

/// Logs every iteration through `tracing` and never acts.
///
/// Events are emitted under the `tandem_observers::log` target, so they can be
/// filtered separately from the drivers' own logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracingObserver {
    level: Level,
    every: usize,
}

impl TracingObserver {
    /// Logs every iteration at `level`.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level, every: 1 }
    }

    /// Logs only iterations divisible by `every`; the first is always logged.
    #[must_use]
    pub fn every(mut self, every: usize) -> Self {
        self.every = every.max(1);
        self
    }

    fn should_log(&self, iteration: usize) -> bool {
        iteration <= 1 || iteration % self.every == 0
    }

    fn log(&self, iteration: usize, residual: f64) {
        macro_rules! emit {
            ($level:expr) => {
                tracing::event!(target: "tandem_observers::log", $level, iteration, residual, "iteration")
            };
        }
        match self.level {
            Level::TRACE => emit!(Level::TRACE),
            Level::DEBUG => emit!(Level::DEBUG),
            Level::INFO => emit!(Level::INFO),
            Level::WARN => emit!(Level::WARN),
            Level::ERROR => emit!(Level::ERROR),
        }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

impl<E, A> Observer<E, A> for TracingObserver
where
    E: HasResidual + HasIteration,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        let iteration = event.iteration();
        if self.should_log(iteration) {
            self.log(iteration, event.residual());
        }
        None
    }
}
