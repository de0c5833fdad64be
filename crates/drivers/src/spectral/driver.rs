use tandem_core::{DriverKind, Integration, MovingGrid, SpectralConfig, SpectralState, ZoneSet};

use crate::step::step_zone;
use crate::{Driver, StepReport};

use super::{Error, SolutionHistory, SpectralOperator, set_spectral_method, set_time_spectral_velocities};

type VelocityHook<I> = fn(&SpectralOperator, &mut ZoneSet<I>) -> Result<(), Error>;

/// Couples periodic time instances through a spectral derivative operator.
///
/// Each zone is one time instance. The operator is built on the first
/// [`run`](Driver::run) and reused until [`reconfigure`](Self::reconfigure)
/// changes the spectral settings.
pub struct SpectralDriver<I: Integration> {
    zones: ZoneSet<I>,
    config: SpectralConfig,
    operator: Option<SpectralOperator>,
    velocities: Option<VelocityHook<I>>,
}

impl<I> SpectralDriver<I>
where
    I: Integration,
    I::Solvers: SpectralState,
{
    /// Creates a driver for static meshes.
    ///
    /// # Errors
    ///
    /// Returns an error if there are fewer than two zones, if `config` is
    /// invalid for the zone count, or if any zone requests grid movement.
    /// Use [`with_moving_grid`](Self::with_moving_grid) for moving meshes.
    pub fn new(zones: ZoneSet<I>, config: SpectralConfig) -> Result<Self, Error> {
        Self::check(&zones, &config)?;
        if let Some(zone) = zones.iter().find(|zone| zone.config().grid_movement) {
            return Err(Error::GridMovement { zone: zone.id() });
        }
        Ok(Self {
            zones,
            config,
            operator: None,
            velocities: None,
        })
    }

    /// Creates a driver that also sets spectral grid velocities whenever the
    /// operator is built.
    ///
    /// # Errors
    ///
    /// Returns an error if there are fewer than two zones or if `config` is
    /// invalid for the zone count.
    pub fn with_moving_grid(zones: ZoneSet<I>, config: SpectralConfig) -> Result<Self, Error>
    where
        I::Geometry: MovingGrid,
    {
        Self::check(&zones, &config)?;
        Ok(Self {
            zones,
            config,
            operator: None,
            velocities: Some(set_time_spectral_velocities::<I>),
        })
    }

    fn check(zones: &ZoneSet<I>, config: &SpectralConfig) -> Result<(), Error> {
        if zones.len() < 2 {
            return Err(Error::ZoneCount(zones.len()));
        }
        config.validate(zones.len())?;
        Ok(())
    }

    #[must_use]
    pub fn config(&self) -> &SpectralConfig {
        &self.config
    }

    /// Returns the cached operator, if one has been built.
    #[must_use]
    pub fn operator(&self) -> Option<&SpectralOperator> {
        self.operator.as_ref()
    }

    #[must_use]
    pub fn zones(&self) -> &ZoneSet<I> {
        &self.zones
    }

    pub fn zones_mut(&mut self) -> &mut ZoneSet<I> {
        &mut self.zones
    }

    #[must_use]
    pub fn into_zones(self) -> ZoneSet<I> {
        self.zones
    }

    /// Replaces the spectral settings.
    ///
    /// If the settings change, the cached operator is dropped and rebuilt on
    /// the next run.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid for the zone count. The
    /// current settings are kept in that case.
    pub fn reconfigure(&mut self, config: SpectralConfig) -> Result<(), Error> {
        config.validate(self.zones.len())?;
        if config != self.config {
            tracing::info!(method = ?config.method, period = config.period, "spectral settings changed");
            self.config = config;
            self.operator = None;
        }
        Ok(())
    }

    /// Builds the operator and refreshes grid velocities when needed.
    fn build_operator(&mut self) -> Result<SpectralOperator, Error> {
        let operator = SpectralOperator::from_config(&self.config, self.zones.len())?;
        if let Some(hook) = self.velocities {
            hook(&operator, &mut self.zones)?;
        }
        Ok(operator)
    }

    fn step(&mut self, operator: &SpectralOperator, step: usize) -> Result<StepReport, Error> {
        let history = SolutionHistory::capture(&self.zones)?;

        for zone in self.zones.iter_mut() {
            let id = zone.id();
            set_spectral_method(operator, &history, id, zone.solvers_mut(), self.config.adjoint)?;
        }

        let residuals = self
            .zones
            .iter_mut()
            .map(|zone| step_zone(zone, step))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StepReport { step, residuals })
    }
}

impl<I> Driver for SpectralDriver<I>
where
    I: Integration,
    I::Solvers: SpectralState,
{
    type Report = StepReport;
    type Error = Error;

    fn kind(&self) -> DriverKind {
        DriverKind::Spectral
    }

    fn n_zones(&self) -> usize {
        self.zones.len()
    }

    #[tracing::instrument(name = "spectral", skip(self))]
    fn run(&mut self, step: usize) -> Result<StepReport, Error> {
        let operator = match self.operator.take() {
            Some(operator) => operator,
            None => self.build_operator()?,
        };

        let report = self.step(&operator, step);
        self.operator = Some(operator);
        report
    }
}

impl<I: Integration> std::fmt::Debug for SpectralDriver<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectralDriver")
            .field("zones", &self.zones)
            .field("config", &self.config)
            .field("operator", &self.operator)
            .field("moving_grid", &self.velocities.is_some())
            .finish()
    }
}
