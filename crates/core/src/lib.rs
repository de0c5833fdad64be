//! Core traits and types for the Tandem driver layer.
//!
//! This crate defines the shared abstractions that drivers, observers, and
//! zone implementations build on:
//!
//! - [`Zone`] and [`ZoneSet`]: a sub-domain owning its geometry, solvers,
//!   integration scheme, and numerics, and the arena that indexes zones by
//!   [`ZoneId`]
//! - [`Integration`]: the external "advance one step" contract of a zone
//! - [`SpectralState`], [`MovingGrid`], [`FluidInterface`],
//!   [`StructuralInterface`], [`MeshDeformer`]: capabilities the coupling
//!   drivers require from a zone's collaborators
//! - [`Observer`]: receives driver events and optionally returns control actions
//! - [`SimulationConfig`] and [`preprocess`]: configuration and the
//!   composition root that assembles zones before the first run

mod capability;
pub mod config;
mod integration;
mod observer;
pub mod preprocess;
mod zone;

pub use capability::{
    FluidInterface, MeshDeformer, MovingGrid, SpectralState, StructuralInterface,
};
pub use config::{
    ConfigError, DriverKind, Equation, FsiConfig, Predictor, Relaxation, SimulationConfig,
    SpectralConfig, SpectralMethod, ZoneConfig,
};
pub use integration::{GeometryOf, Integration, NumericsOf, SolversOf};
pub use observer::Observer;
pub use preprocess::{Assembler, PreprocessError, Stage, assemble_zone, preprocess};
pub use zone::{Zone, ZoneId, ZoneSet};
