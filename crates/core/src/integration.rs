use crate::config::ZoneConfig;

/// The integration scheme of a zone: the external service that advances the
/// zone's solver states by one step.
///
/// The scheme owns the type choices for the rest of the zone: the geometry it
/// integrates over, the solver-state bundle it drives, and the numerics it
/// evaluates residuals with. Spatial discretization, flux evaluation, and the
/// linear solve all live behind [`advance`](Integration::advance).
pub trait Integration {
    type Geometry;
    type Solvers;
    type Numerics;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Synchronizes boundary and forcing terms before a step.
    ///
    /// The default implementation does nothing. Only implement this method
    /// if the scheme needs per-step setup.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if preprocessing fails.
    fn preprocess(
        &mut self,
        _geometry: &mut Self::Geometry,
        _solvers: &mut Self::Solvers,
        _numerics: &Self::Numerics,
        _config: &ZoneConfig,
        _step: usize,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Advances the solver states by one step.
    ///
    /// Returns the zone's convergence metric for the step, typically the RMS
    /// of the density residual. On return the solution arrays and residuals
    /// must be consistent.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the step fails.
    fn advance(
        &mut self,
        geometry: &mut Self::Geometry,
        solvers: &mut Self::Solvers,
        numerics: &Self::Numerics,
        config: &ZoneConfig,
        step: usize,
    ) -> Result<f64, Self::Error>;

    /// Commits a completed step, e.g. by shifting dual time levels.
    ///
    /// Called once per outer step after the driver accepts the step. The
    /// default implementation does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the update fails.
    fn update(
        &mut self,
        _geometry: &mut Self::Geometry,
        _solvers: &mut Self::Solvers,
        _numerics: &Self::Numerics,
        _config: &ZoneConfig,
        _step: usize,
    ) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Type alias for the geometry of an [`Integration`] scheme.
pub type GeometryOf<I> = <I as Integration>::Geometry;

/// Type alias for the solver-state bundle of an [`Integration`] scheme.
pub type SolversOf<I> = <I as Integration>::Solvers;

/// Type alias for the numerics bundle of an [`Integration`] scheme.
pub type NumericsOf<I> = <I as Integration>::Numerics;
