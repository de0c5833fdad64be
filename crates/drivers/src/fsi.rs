//! Partitioned fluid-structure interaction by Block Gauss-Seidel.
//!
//! # Algorithm
//!
//! Each outer step alternates between the flow and structural zones until
//! the interface displacement stops changing:
//!
//! 1. Advance the flow zone on the current mesh.
//! 2. Read the interface traction and load the structure with it.
//! 3. Advance the structural zone and read the new interface displacement.
//! 4. Measure `‖d_new − d_current‖₂`, relax the update, and deform the flow
//!    mesh to the relaxed displacement.
//!
//! The loop stops when the delta norm falls below the tolerance, when an
//! observer asks it to, or after `max_iters` passes.
//!
//! Before the first pass the displacement can be extrapolated from earlier
//! steps with a [`Predictor`](tandem_core::Predictor), and each update can be
//! under-relaxed with a fixed or Aitken factor, see [`Relaxer`].
//!
//! # Observer Events
//!
//! The driver emits one [`Event`] per coupling iteration, after the mesh has
//! been deformed. Observers can return [`Action::StopEarly`] to end the loop.
//! The tolerance is checked first, so the converging iteration is reported
//! but cannot be turned into a stop.
//!
//! # Non-convergence
//!
//! Hitting the iteration cap or being stopped by an observer is not an
//! error. The returned [`Solution`] has [`Status::MaxIters`] or
//! [`Status::StoppedByObserver`], a warning is logged, and the step is left
//! uncommitted. The caller retries, aborts, or calls
//! [`FsiDriver::commit`] to proceed.

mod action;
mod driver;
mod error;
mod event;
mod predictor;
mod relaxation;
mod solution;
mod state;

#[cfg(test)]
mod tests;

pub use action::Action;
pub use driver::FsiDriver;
pub use error::Error;
pub use event::Event;
pub use predictor::DisplacementHistory;
pub use relaxation::Relaxer;
pub use solution::{Solution, Status};
