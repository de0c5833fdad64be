//! Zone assembly: the composition root that turns a configuration and a set
//! of geometries into a [`ZoneSet`].
//!
//! Geometry reading and partitioning happen elsewhere; [`preprocess`] takes
//! the geometries as given and asks an [`Assembler`] to build the solver
//! states, integration scheme, and numerics of each zone in that order.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::config::{ConfigError, SimulationConfig, ZoneConfig};
use crate::integration::{GeometryOf, Integration, NumericsOf, SolversOf};
use crate::zone::{Zone, ZoneId, ZoneSet};

/// Builds the per-zone parts that depend on the physics being solved.
pub trait Assembler {
    type Integration: Integration;
    type Error: StdError + Send + Sync + 'static;

    /// Creates the solver states for a zone.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the solvers cannot be built.
    fn solvers(
        &mut self,
        zone: ZoneId,
        geometry: &GeometryOf<Self::Integration>,
        config: &ZoneConfig,
    ) -> Result<SolversOf<Self::Integration>, Self::Error>;

    /// Creates the integration scheme for a zone.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the scheme cannot be built.
    fn integration(
        &mut self,
        zone: ZoneId,
        geometry: &GeometryOf<Self::Integration>,
        config: &ZoneConfig,
    ) -> Result<Self::Integration, Self::Error>;

    /// Creates the numerics for a zone, after its solvers exist.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the numerics cannot be built.
    fn numerics(
        &mut self,
        zone: ZoneId,
        geometry: &GeometryOf<Self::Integration>,
        solvers: &SolversOf<Self::Integration>,
        config: &ZoneConfig,
    ) -> Result<NumericsOf<Self::Integration>, Self::Error>;
}

/// The assembly stage that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Solvers,
    Integration,
    Numerics,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Solvers => "solvers",
            Self::Integration => "integration",
            Self::Numerics => "numerics",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while assembling zones.
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("expected {expected} geometries, got {found}")]
    GeometryCount { expected: usize, found: usize },

    #[error("zone {zone}: failed to build {stage}")]
    Assembly {
        zone: ZoneId,
        stage: Stage,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("zone at position {position} has id {found}")]
    ZoneOrder { position: usize, found: ZoneId },
}

/// Assembles one zone from its geometry and configuration.
///
/// # Errors
///
/// Returns [`PreprocessError::Assembly`] naming the stage that failed.
pub fn assemble_zone<A: Assembler>(
    assembler: &mut A,
    id: ZoneId,
    geometry: GeometryOf<A::Integration>,
    config: ZoneConfig,
) -> Result<Zone<A::Integration>, PreprocessError> {
    let fail = |stage: Stage| {
        move |err: A::Error| PreprocessError::Assembly {
            zone: id,
            stage,
            source: Box::new(err),
        }
    };

    let solvers = assembler
        .solvers(id, &geometry, &config)
        .map_err(fail(Stage::Solvers))?;
    let integration = assembler
        .integration(id, &geometry, &config)
        .map_err(fail(Stage::Integration))?;
    let numerics = assembler
        .numerics(id, &geometry, &solvers, &config)
        .map_err(fail(Stage::Numerics))?;

    Ok(Zone::new(id, config, geometry, solvers, integration, numerics))
}

/// Validates `config` and assembles one zone per geometry.
///
/// Zone `i` is built from `geometries[i]` and `config.zones[i]`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, if the geometry count
/// does not match the zone count, or if any zone fails to assemble.
pub fn preprocess<A: Assembler>(
    assembler: &mut A,
    config: &SimulationConfig,
    geometries: Vec<GeometryOf<A::Integration>>,
) -> Result<ZoneSet<A::Integration>, PreprocessError> {
    config.validate()?;

    if geometries.len() != config.n_zones() {
        return Err(PreprocessError::GeometryCount {
            expected: config.n_zones(),
            found: geometries.len(),
        });
    }

    let zones = geometries
        .into_iter()
        .zip(config.zones.iter().cloned())
        .enumerate()
        .map(|(index, (geometry, zone_config))| {
            let zone = assemble_zone(assembler, ZoneId(index), geometry, zone_config)?;
            tracing::debug!(zone = index, name = ?zone.config().name, "assembled zone");
            Ok(zone)
        })
        .collect::<Result<Vec<_>, PreprocessError>>()?;

    ZoneSet::new(zones)
}
