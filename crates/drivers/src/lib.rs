//! Drivers that advance a set of zones by one outer step.
//!
//! Every driver implements [`Driver`]. The drivers differ in how zones
//! interact during a step:
//!
//! - [`single`]: one zone, no coupling
//! - [`multi`]: independent zones advanced in index order
//! - [`spectral`]: periodic time instances coupled through a spectral
//!   derivative operator
//! - [`fsi`]: a flow zone and a structural zone coupled by Block Gauss-Seidel
//!
//! Zones are assembled beforehand with [`tandem_core::preprocess`].

mod error;
mod report;
mod step;

#[cfg(test)]
mod testing;

pub mod fsi;
pub mod multi;
pub mod single;
pub mod spectral;

pub use error::ZoneError;
pub use fsi::FsiDriver;
pub use multi::MultiZoneDriver;
pub use report::StepReport;
pub use single::SingleZoneDriver;
pub use spectral::SpectralDriver;

use tandem_core::DriverKind;

/// Advances a simulation by one outer step at a time.
///
/// On a successful return every zone is consistent: residuals computed and
/// solutions updated for `step`.
pub trait Driver {
    /// What a completed step reports back.
    type Report;

    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the tag this driver is selected by in configuration.
    fn kind(&self) -> DriverKind;

    /// Returns the number of zones the driver owns.
    fn n_zones(&self) -> usize;

    /// Advances every zone by one outer step.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if a zone or a coupling step fails.
    fn run(&mut self, step: usize) -> Result<Self::Report, Self::Error>;
}
