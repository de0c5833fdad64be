//! Reusable observers for Tandem coupling drivers.
//!
//! Observers implement [`Observer`] generically over the capability traits in
//! [`traits`], so they work with any driver event that exposes a residual and
//! an iteration counter. The FSI driver's [`Event`] and [`Action`] implement
//! all of them.
//!
//! - [`ResidualHistory`]: records residuals for later inspection
//! - [`DivergenceGuard`]: stops a loop whose residual keeps growing
//! - [`TracingObserver`]: logs each iteration through `tracing`
//!
//! # Features
//!
//! - `plot`: enables [`PlotObserver`] for viewing convergence in an egui
//!   window. Adds dependencies on `eframe` and `egui_plot`.
//!
//! [`Observer`]: tandem_core::Observer
//! [`Event`]: tandem_drivers::fsi::Event
//! [`Action`]: tandem_drivers::fsi::Action

pub mod traits;

mod divergence;
mod history;
mod log;

#[cfg(feature = "plot")]
mod plot;

pub use divergence::DivergenceGuard;
pub use history::ResidualHistory;
pub use log::TracingObserver;

#[cfg(feature = "plot")]
pub use plot::{PlotObserver, Plottable, ShowConfig};
