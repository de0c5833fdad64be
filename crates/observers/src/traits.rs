//! Capability traits for driver-agnostic observers.
//!
//! These traits abstract over driver-specific event and action types, so one
//! observer can watch any iterative driver whose types implement them.
//!
//! # Event traits
//!
//! - [`HasResidual`]: events that carry a convergence measure
//! - [`HasIteration`]: events that carry an iteration counter
//!
//! # Action traits
//!
//! - [`CanStopEarly`]: actions that can end the iteration
//!
//! # Example
//!
//! ```rust
//! use tandem_core::Observer;
//! use tandem_observers::traits::{CanStopEarly, HasIteration, HasResidual};
//!
//! /// Accepts a looser tolerance once enough iterations have run.
//! struct GoodEnough {
//!     tolerance: f64,
//!     min_iters: usize,
//! }
//!
//! impl<E: HasResidual + HasIteration, A: CanStopEarly> Observer<E, A> for GoodEnough {
//!     fn observe(&mut self, event: &E) -> Option<A> {
//!         (event.iteration() >= self.min_iters && event.residual() < self.tolerance)
//!             .then(A::stop_early)
//!     }
//! }
//! ```

use tandem_drivers::fsi;

/// An event that carries a residual value.
pub trait HasResidual {
    /// Returns the residual for this event.
    fn residual(&self) -> f64;
}

/// An event that carries an iteration counter.
pub trait HasIteration {
    /// Returns the iteration, starting at 1.
    fn iteration(&self) -> usize;
}

/// An action type that can signal early termination.
pub trait CanStopEarly {
    /// Returns the action that stops the driver early.
    fn stop_early() -> Self;
}

impl HasResidual for fsi::Event {
    fn residual(&self) -> f64 {
        self.delta_norm
    }
}

impl HasIteration for fsi::Event {
    fn iteration(&self) -> usize {
        self.iter
    }
}

impl CanStopEarly for fsi::Action {
    fn stop_early() -> Self {
        Self::StopEarly
    }
}
