//! Spectral coupling of periodic time instances.
//!
//! # Method
//!
//! A periodic unsteady solution is represented by `n` time instances spread
//! evenly over one period, each stored as its own zone. The time derivative
//! at instance `i` is a weighted sum of all instances, `Σ_j D[i][j] · U_j`,
//! where `D` is a dense [`SpectralOperator`]. Each step the driver adds that
//! sum to instance `i` as a pseudo-source term and advances every instance
//! as a steady problem.
//!
//! Two operators are supported:
//!
//! - **Time-spectral**: closed-form entries for uniformly spaced harmonics of
//!   the period.
//! - **Harmonic balance**: an arbitrary set of `H` frequencies with
//!   `n = 2H + 1` instances. The operator is built by inverting the Fourier
//!   basis at the instances, see [`linalg::inverse_block`].
//!
//! # Step order
//!
//! [`SpectralDriver::run`](crate::Driver::run) performs, in order:
//!
//! 1. Build the operator if none is cached, and refresh grid velocities for
//!    moving meshes.
//! 2. Capture a [`SolutionHistory`] of every instance.
//! 3. Set the source term of every instance from that history.
//! 4. Preprocess, advance, and update every instance.
//!
//! The history is captured in full before any source is written, so the
//! result does not depend on the order in which zones are visited.

mod driver;
mod error;
mod history;
mod operator;
mod source;

pub mod linalg;

#[cfg(test)]
mod tests;

pub use driver::SpectralDriver;
pub use error::Error;
pub use history::SolutionHistory;
pub use operator::SpectralOperator;
pub use source::{set_spectral_method, set_time_spectral_velocities};
