//! # Periodic Oscillator with the Spectral Driver
//!
//! Solves the periodic steady state of a forced, damped first-order system
//!
//! ```text
//! du/dt + λ·u = cos(ω·t)
//! ```
//!
//! without time marching. Five time instances spread over one period are
//! assembled from a TOML case, coupled through the time-spectral operator,
//! and driven to convergence in pseudo-time. The converged instances are
//! compared with the exact periodic solution
//! `u(t) = (λ·cos ωt + ω·sin ωt) / (λ² + ω²)`.
//!
//! The case is then switched to harmonic balance with the same two
//! frequencies. Both operators are exact for this signal, so the solution
//! stays put.
//!
//! ## Running the Example
//!
//! ```sh
//! RUST_LOG=debug cargo run -p tandem-examples --example spectral_oscillator
//! ```

use std::error::Error;

use ndarray::{Array2, ArrayView2};
use tandem_core::{
    Assembler, Equation, Integration, SimulationConfig, SpectralConfig, SpectralState, ZoneConfig,
    ZoneId, preprocess,
};
use tandem_drivers::{Driver, SpectralDriver};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

const CASE: &str = r#"
driver = "spectral"

[[zones]]
name = "t0"
equations = ["flow"]

[[zones]]
name = "t1"
equations = ["flow"]

[[zones]]
name = "t2"
equations = ["flow"]

[[zones]]
name = "t3"
equations = ["flow"]

[[zones]]
name = "t4"
equations = ["flow"]

[spectral]
method = "time-spectral"
period = 6.283185307179586
"#;

const DAMPING: f64 = 1.0;
const PSEUDO_STEP: f64 = 0.2;
const TOLERANCE: f64 = 1e-12;
const MAX_STEPS: usize = 1000;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = SimulationConfig::from_toml_str(CASE)?;
    let period = config
        .spectral
        .as_ref()
        .map(|spectral| spectral.period)
        .ok_or("case has no [spectral] section")?;
    let omega = 2.0 * std::f64::consts::PI / period;
    let n = config.n_zones();

    let geometries = (0..n)
        .map(|i| Instance {
            time: i as f64 * period / n as f64,
        })
        .collect();
    let mut assembler = OscillatorAssembler { omega };
    let zones = preprocess(&mut assembler, &config, geometries)?;

    let spectral = config.spectral.clone().ok_or("case has no [spectral] section")?;
    let mut driver = SpectralDriver::new(zones, spectral)?;

    let steps = converge(&mut driver)?;
    println!("time-spectral converged in {steps} pseudo-steps");
    print_instances(&driver, omega);

    let frequencies = SpectralConfig::uniform_frequencies(period, 2);
    driver.reconfigure(SpectralConfig::harmonic_balance(period, frequencies))?;
    let steps = converge(&mut driver)?;
    println!("harmonic balance converged in {steps} pseudo-steps");
    print_instances(&driver, omega);

    Ok(())
}

/// Runs pseudo-steps until the largest instance residual drops below
/// [`TOLERANCE`].
fn converge(driver: &mut SpectralDriver<PseudoTime>) -> Result<usize, Box<dyn Error>> {
    for step in 0..MAX_STEPS {
        let report = driver.run(step)?;
        let residual = report.max_residual().unwrap_or(f64::NAN);
        if step % 50 == 0 {
            tracing::info!(step, residual, "pseudo-time");
        }
        if residual < TOLERANCE {
            return Ok(step + 1);
        }
    }
    Err(format!("no convergence in {MAX_STEPS} pseudo-steps").into())
}

fn print_instances(driver: &SpectralDriver<PseudoTime>, omega: f64) {
    println!("{:>8} {:>14} {:>14}", "t", "spectral", "exact");
    for zone in driver.zones() {
        let t = zone.geometry().time;
        let exact = (DAMPING * (omega * t).cos() + omega * (omega * t).sin())
            / (DAMPING.powi(2) + omega.powi(2));
        println!("{t:>8.4} {:>14.10} {exact:>14.10}", zone.solvers().u[[0, 0]]);
    }
}

/// A time instance: the point in the period it represents.
#[derive(Debug)]
struct Instance {
    time: f64,
}

#[derive(Debug)]
struct OscillatorState {
    u: Array2<f64>,
    source: Array2<f64>,
}

impl SpectralState for OscillatorState {
    fn solution(&self, equation: Equation) -> Option<ArrayView2<'_, f64>> {
        (equation == Equation::Flow).then(|| self.u.view())
    }

    fn set_spectral_source(&mut self, equation: Equation, source: Array2<f64>) {
        if equation == Equation::Flow {
            self.source = source;
        }
    }
}

/// Explicit pseudo-time march of `S + λ·u − cos(ω·t) = 0`.
#[derive(Debug)]
struct PseudoTime {
    omega: f64,
}

impl Integration for PseudoTime {
    type Geometry = Instance;
    type Solvers = OscillatorState;
    type Numerics = f64;
    type Error = std::convert::Infallible;

    fn advance(
        &mut self,
        instance: &mut Instance,
        state: &mut OscillatorState,
        dtau: &f64,
        _config: &ZoneConfig,
        _step: usize,
    ) -> Result<f64, Self::Error> {
        let forcing = (self.omega * instance.time).cos();
        let residual = &state.source + &state.u.mapv(|u| DAMPING * u - forcing);
        state.u.scaled_add(-dtau, &residual);
        Ok(residual.iter().fold(0.0, |max, r| f64::max(max, r.abs())))
    }
}

#[derive(Debug, Error)]
#[error("zone {0} does not solve the flow equation")]
struct NoFlow(ZoneId);

struct OscillatorAssembler {
    omega: f64,
}

impl Assembler for OscillatorAssembler {
    type Integration = PseudoTime;
    type Error = NoFlow;

    fn solvers(
        &mut self,
        zone: ZoneId,
        _instance: &Instance,
        config: &ZoneConfig,
    ) -> Result<OscillatorState, NoFlow> {
        if !config.has(Equation::Flow) {
            return Err(NoFlow(zone));
        }
        Ok(OscillatorState {
            u: Array2::zeros((1, 1)),
            source: Array2::zeros((1, 1)),
        })
    }

    fn integration(
        &mut self,
        _zone: ZoneId,
        _instance: &Instance,
        _config: &ZoneConfig,
    ) -> Result<PseudoTime, NoFlow> {
        Ok(PseudoTime { omega: self.omega })
    }

    fn numerics(
        &mut self,
        _zone: ZoneId,
        _instance: &Instance,
        _state: &OscillatorState,
        _config: &ZoneConfig,
    ) -> Result<f64, NoFlow> {
        Ok(PSEUDO_STEP)
    }
}
