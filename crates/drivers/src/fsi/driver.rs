use ndarray::Array2;
use tandem_core::{
    DriverKind, Equation, FluidInterface, FsiConfig, Integration, MeshDeformer, Observer,
    StructuralInterface, Zone, ZoneId,
};

use crate::Driver;
use crate::step::{advance_zone, update_zone};

use super::{
    Action, DisplacementHistory, Error, Event, Relaxer, Solution, Status, state::CouplingState,
};

/// Couples a flow zone and a structural zone by Block Gauss-Seidel.
///
/// The flow zone must have id 0 and the structural zone id 1.
pub struct FsiDriver<F, S, D>
where
    F: Integration,
    S: Integration,
{
    flow: Zone<F>,
    structure: Zone<S>,
    deformer: D,
    config: FsiConfig,
    relaxer: Relaxer,
    history: DisplacementHistory,
    pending: Option<Array2<f64>>,
}

impl<F, S, D> FsiDriver<F, S, D>
where
    F: Integration,
    F::Solvers: FluidInterface,
    S: Integration,
    S::Solvers: StructuralInterface,
    D: MeshDeformer<F::Geometry>,
{
    /// Creates the driver.
    ///
    /// # Errors
    ///
    /// Returns an error if the zones have the wrong ids or equations, or if
    /// `config` is invalid.
    pub fn new(
        flow: Zone<F>,
        structure: Zone<S>,
        deformer: D,
        config: FsiConfig,
    ) -> Result<Self, Error> {
        check_role("flow", &flow, ZoneId(0), Equation::Flow)?;
        check_role("structural", &structure, ZoneId(1), Equation::Structural)?;
        config.validate()?;

        Ok(Self {
            flow,
            structure,
            deformer,
            relaxer: Relaxer::new(config.relaxation),
            config,
            history: DisplacementHistory::new(),
            pending: None,
        })
    }

    #[must_use]
    pub fn config(&self) -> &FsiConfig {
        &self.config
    }

    #[must_use]
    pub fn flow(&self) -> &Zone<F> {
        &self.flow
    }

    pub fn flow_mut(&mut self) -> &mut Zone<F> {
        &mut self.flow
    }

    #[must_use]
    pub fn structure(&self) -> &Zone<S> {
        &self.structure
    }

    pub fn structure_mut(&mut self) -> &mut Zone<S> {
        &mut self.structure
    }

    #[must_use]
    pub fn deformer(&self) -> &D {
        &self.deformer
    }

    /// Returns the displacements of the last committed steps.
    #[must_use]
    pub fn history(&self) -> &DisplacementHistory {
        &self.history
    }

    /// Runs the coupling loop for `step`, reporting each iteration to
    /// `observer`.
    ///
    /// Every iteration is reported, including the converging one. The
    /// tolerance is checked first, so a converging iteration is never
    /// reported as stopped.
    ///
    /// Only converged steps are committed. A step that hits the iteration cap
    /// or is stopped by the observer is left uncommitted so the caller can
    /// retry, abort, or [`commit`](Self::commit) it anyway.
    ///
    /// # Errors
    ///
    /// Returns an error if a zone or the mesh deformer fails, or if the
    /// interface arrays change shape.
    #[tracing::instrument(name = "fsi", skip(self, observer))]
    pub fn run_observed<Obs>(&mut self, step: usize, mut observer: Obs) -> Result<Solution, Error>
    where
        Obs: Observer<Event, Action>,
    {
        let initial = self.structure.solvers().interface_displacement();
        let shape = initial.dim();
        let mut state = CouplingState::new(initial);
        self.relaxer.reset();

        if let Some(predicted) = self.history.predict(self.config.predictor) {
            check_shape("predicted displacement", shape, &predicted)?;
            self.deformer
                .deform(self.flow.geometry_mut(), predicted.view())
                .map_err(Error::deform)?;
            state.displacement = predicted;
        }

        let mut stopped = false;
        for iter in 1..=self.config.max_iters {
            advance_zone(&mut self.flow, step)?;

            let traction = self.flow.solvers().interface_traction();
            check_shape("traction", shape, &traction)?;

            self.structure
                .solvers_mut()
                .set_interface_load(traction.view());
            advance_zone(&mut self.structure, step)?;

            let computed = self.structure.solvers().interface_displacement();
            check_shape("displacement", shape, &computed)?;

            let delta_norm = l2_distance(&computed, &state.displacement);
            let relaxed = self
                .relaxer
                .relax(state.displacement.view(), computed.view());

            self.deformer
                .deform(self.flow.geometry_mut(), relaxed.view())
                .map_err(Error::deform)?;
            state.record(iter, traction, relaxed, delta_norm);

            let event = Event {
                step,
                iter,
                delta_norm,
                relaxation: self.relaxer.factor(),
            };
            tracing::debug!(iter, delta_norm, relaxation = event.relaxation, "coupling iteration");

            if delta_norm < self.config.tolerance {
                state.converged = true;
                observer.observe(&event);
                break;
            }
            if let Some(Action::StopEarly) = observer.observe(&event) {
                stopped = true;
                break;
            }
        }

        let status = if state.converged {
            Status::Converged
        } else if stopped {
            Status::StoppedByObserver
        } else {
            Status::MaxIters
        };

        self.pending = Some(state.displacement.clone());
        let committed = match status {
            Status::Converged => {
                self.commit(step)?;
                true
            }
            Status::MaxIters | Status::StoppedByObserver => {
                tracing::warn!(
                    step,
                    ?status,
                    iters = state.iter,
                    delta_norm = state.delta_norm,
                    tolerance = self.config.tolerance,
                    "fsi coupling did not converge"
                );
                false
            }
        };

        tracing::info!(step, ?status, iters = state.iter, delta_norm = state.delta_norm, "fsi step finished");
        Ok(state.into_solution(status, committed))
    }

    /// Commits `step`: updates both zones and records the interface
    /// displacement for the predictor.
    ///
    /// [`run_observed`](Self::run_observed) calls this for converged steps
    /// only. Call it directly to accept a step that hit the iteration cap or
    /// was stopped by an observer.
    ///
    /// # Errors
    ///
    /// Returns an error if either zone fails to update.
    pub fn commit(&mut self, step: usize) -> Result<(), Error> {
        update_zone(&mut self.flow, step)?;
        update_zone(&mut self.structure, step)?;

        let displacement = match self.pending.take() {
            Some(displacement) => displacement,
            None => self.structure.solvers().interface_displacement(),
        };
        self.history.push(displacement);
        Ok(())
    }
}

impl<F, S, D> Driver for FsiDriver<F, S, D>
where
    F: Integration,
    F::Solvers: FluidInterface,
    S: Integration,
    S::Solvers: StructuralInterface,
    D: MeshDeformer<F::Geometry>,
{
    type Report = Solution;
    type Error = Error;

    fn kind(&self) -> DriverKind {
        DriverKind::Fsi
    }

    fn n_zones(&self) -> usize {
        2
    }

    fn run(&mut self, step: usize) -> Result<Solution, Error> {
        self.run_observed(step, ())
    }
}

impl<F, S, D> std::fmt::Debug for FsiDriver<F, S, D>
where
    F: Integration,
    S: Integration,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsiDriver")
            .field("flow", &self.flow)
            .field("structure", &self.structure)
            .field("config", &self.config)
            .field("history_len", &self.history.len())
            .finish_non_exhaustive()
    }
}

fn check_role<I: Integration>(
    role: &'static str,
    zone: &Zone<I>,
    expected: ZoneId,
    equation: Equation,
) -> Result<(), Error> {
    if zone.id() != expected {
        return Err(Error::ZoneRole {
            role,
            expected,
            found: zone.id(),
        });
    }
    if !zone.config().has(equation) {
        return Err(tandem_core::ConfigError::MissingEquation {
            zone: expected.index(),
            equation,
        }
        .into());
    }
    Ok(())
}

fn check_shape(
    quantity: &'static str,
    expected: (usize, usize),
    array: &Array2<f64>,
) -> Result<(), Error> {
    if array.dim() == expected {
        Ok(())
    } else {
        Err(Error::InterfaceShape {
            quantity,
            expected,
            found: array.dim(),
        })
    }
}

fn l2_distance(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
