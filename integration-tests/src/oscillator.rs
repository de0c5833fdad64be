use std::f64::consts::PI;

use ndarray::{Array2, ArrayView2};
use tandem_core::{
    Assembler, Equation, Integration, MovingGrid, SpectralState, ZoneConfig, ZoneId,
};
use thiserror::Error;

/// One time instance: its time in the period and a small moving mesh.
#[derive(Debug, Clone)]
pub struct Instance {
    pub time: f64,
    pub coordinates: Array2<f64>,
    pub velocities: Option<Array2<f64>>,
}

impl Instance {
    /// Creates `n` instances spread evenly over `period`.
    ///
    /// Each mesh is two nodes on a line, shifted by `amplitude · sin(ω·t)`.
    #[must_use]
    pub fn spread(period: f64, n: usize, amplitude: f64) -> Vec<Self> {
        let omega = 2.0 * PI / period;
        (0..n)
            .map(|i| {
                let time = i as f64 * period / n as f64;
                let shift = amplitude * (omega * time).sin();
                Self {
                    time,
                    coordinates: ndarray::array![[0.0 + shift], [1.0 + shift]],
                    velocities: None,
                }
            })
            .collect()
    }
}

impl MovingGrid for Instance {
    fn coordinates(&self) -> ArrayView2<'_, f64> {
        self.coordinates.view()
    }

    fn set_grid_velocities(&mut self, velocities: Array2<f64>) {
        self.velocities = Some(velocities);
    }
}

/// Solution and spectral sources of one instance.
#[derive(Debug, Clone)]
pub struct OscillatorState {
    pub flow: Array2<f64>,
    pub turbulence: Option<Array2<f64>>,
    pub flow_source: Option<Array2<f64>>,
    pub turbulence_source: Option<Array2<f64>>,
}

impl SpectralState for OscillatorState {
    fn solution(&self, equation: Equation) -> Option<ArrayView2<'_, f64>> {
        match equation {
            Equation::Flow => Some(self.flow.view()),
            Equation::Turbulence => self.turbulence.as_ref().map(Array2::view),
            Equation::Structural => None,
        }
    }

    fn set_spectral_source(&mut self, equation: Equation, source: Array2<f64>) {
        match equation {
            Equation::Flow => self.flow_source = Some(source),
            Equation::Turbulence => self.turbulence_source = Some(source),
            Equation::Structural => {}
        }
    }
}

#[derive(Debug, Error)]
pub enum OscillatorError {
    #[error("no spectral source was set before advancing")]
    NoSource,

    #[error("zone {0} was rejected by the assembler")]
    Rejected(ZoneId),
}

/// Pseudo-time march of `S + λ·u − cos(ω·t) = 0` on every solution entry.
///
/// The residual reported by [`advance`](Integration::advance) is the largest
/// absolute entry of the left-hand side.
#[derive(Debug, Clone)]
pub struct PseudoTime {
    pub damping: f64,
    pub forcing: f64,
    pub advances: usize,
}

impl PseudoTime {
    /// Returns the periodic solution `u(t)` the march converges to.
    #[must_use]
    pub fn exact(&self, time: f64) -> f64 {
        let (l, w) = (self.damping, self.forcing);
        (l * (w * time).cos() + w * (w * time).sin()) / (l * l + w * w)
    }
}

impl Integration for PseudoTime {
    type Geometry = Instance;
    type Solvers = OscillatorState;
    type Numerics = f64;
    type Error = OscillatorError;

    fn advance(
        &mut self,
        instance: &mut Instance,
        state: &mut OscillatorState,
        dtau: &f64,
        _config: &ZoneConfig,
        _step: usize,
    ) -> Result<f64, OscillatorError> {
        self.advances += 1;
        let source = state.flow_source.as_ref().ok_or(OscillatorError::NoSource)?;
        let forcing = (self.forcing * instance.time).cos();
        let residual = source + &state.flow.mapv(|u| self.damping * u - forcing);
        state.flow.scaled_add(-dtau, &residual);
        Ok(residual.iter().fold(0.0, |max, r| f64::max(max, r.abs())))
    }
}

/// Builds [`PseudoTime`] zones and counts how often it is asked to.
#[derive(Debug, Clone)]
pub struct OscillatorAssembler {
    pub damping: f64,
    pub forcing: f64,
    pub dtau: f64,
    pub n_points: usize,
    pub reject: Option<ZoneId>,
    pub calls: usize,
}

impl OscillatorAssembler {
    #[must_use]
    pub fn new(damping: f64, forcing: f64, dtau: f64) -> Self {
        Self {
            damping,
            forcing,
            dtau,
            n_points: 2,
            reject: None,
            calls: 0,
        }
    }
}

impl Assembler for OscillatorAssembler {
    type Integration = PseudoTime;
    type Error = OscillatorError;

    fn solvers(
        &mut self,
        zone: ZoneId,
        _instance: &Instance,
        config: &ZoneConfig,
    ) -> Result<OscillatorState, OscillatorError> {
        self.calls += 1;
        if self.reject == Some(zone) {
            return Err(OscillatorError::Rejected(zone));
        }
        Ok(OscillatorState {
            flow: Array2::zeros((self.n_points, 1)),
            turbulence: config
                .has(Equation::Turbulence)
                .then(|| Array2::zeros((self.n_points, 1))),
            flow_source: None,
            turbulence_source: None,
        })
    }

    fn integration(
        &mut self,
        _zone: ZoneId,
        _instance: &Instance,
        _config: &ZoneConfig,
    ) -> Result<PseudoTime, OscillatorError> {
        self.calls += 1;
        Ok(PseudoTime {
            damping: self.damping,
            forcing: self.forcing,
            advances: 0,
        })
    }

    fn numerics(
        &mut self,
        _zone: ZoneId,
        _instance: &Instance,
        _state: &OscillatorState,
        _config: &ZoneConfig,
    ) -> Result<f64, OscillatorError> {
        self.calls += 1;
        Ok(self.dtau)
    }
}
