use std::f64::consts::PI;

use approx::assert_abs_diff_eq;
use ndarray::{Array2, ArrayView2};
use tandem_core::{
    ConfigError, Equation, Integration, MovingGrid, SpectralConfig, SpectralState, Zone,
    ZoneConfig, ZoneId, ZoneSet,
};
use thiserror::Error;

use crate::{Driver, ZoneError};

use super::{Error, SpectralDriver, SpectralOperator};

#[derive(Debug, Error)]
#[error("instance diverged")]
struct Diverged;

/// A mesh of `n` one-dimensional nodes.
#[derive(Debug)]
struct Mesh {
    coordinates: Array2<f64>,
    velocities: Option<Array2<f64>>,
}

impl MovingGrid for Mesh {
    fn coordinates(&self) -> ArrayView2<'_, f64> {
        self.coordinates.view()
    }

    fn set_grid_velocities(&mut self, velocities: Array2<f64>) {
        self.velocities = Some(velocities);
    }
}

#[derive(Debug)]
struct InstanceSolvers {
    flow: Array2<f64>,
    turbulence: Option<Array2<f64>>,
    sources: Vec<(Equation, Array2<f64>)>,
    diverge: bool,
}

impl InstanceSolvers {
    fn source(&self, equation: Equation) -> &Array2<f64> {
        self.sources
            .iter()
            .rev()
            .find(|(eq, _)| *eq == equation)
            .map(|(_, source)| source)
            .expect("source was set")
    }
}

impl SpectralState for InstanceSolvers {
    fn solution(&self, equation: Equation) -> Option<ArrayView2<'_, f64>> {
        match equation {
            Equation::Flow => Some(self.flow.view()),
            Equation::Turbulence => self.turbulence.as_ref().map(Array2::view),
            Equation::Structural => None,
        }
    }

    fn set_spectral_source(&mut self, equation: Equation, source: Array2<f64>) {
        self.sources.push((equation, source));
    }
}

/// Pseudo-time march: `U ← U - dt · S`, residual is `max |S|`.
struct PseudoTime;

impl Integration for PseudoTime {
    type Geometry = Mesh;
    type Solvers = InstanceSolvers;
    type Numerics = f64;
    type Error = Diverged;

    fn advance(
        &mut self,
        _geometry: &mut Mesh,
        solvers: &mut InstanceSolvers,
        dt: &f64,
        _config: &ZoneConfig,
        _step: usize,
    ) -> Result<f64, Diverged> {
        if solvers.diverge {
            return Err(Diverged);
        }
        let source = solvers.source(Equation::Flow).clone();
        solvers.flow.scaled_add(-dt, &source);
        Ok(source.iter().fold(0.0, |max, s| f64::max(max, s.abs())))
    }
}

fn instances(n: usize, config: ZoneConfig, signal: impl Fn(usize) -> f64) -> ZoneSet<PseudoTime> {
    let zones = (0..n)
        .map(|i| {
            let value = signal(i);
            let turbulence = config
                .has(Equation::Turbulence)
                .then(|| Array2::from_elem((3, 1), 2.0 * value));
            Zone::new(
                ZoneId(i),
                config.clone(),
                Mesh {
                    coordinates: Array2::from_elem((2, 1), value),
                    velocities: None,
                },
                InstanceSolvers {
                    flow: Array2::from_elem((3, 2), value),
                    turbulence,
                    sources: Vec::new(),
                    diverge: false,
                },
                PseudoTime,
                0.01,
            )
        })
        .collect();
    ZoneSet::new(zones).unwrap()
}

fn flow_only() -> ZoneConfig {
    ZoneConfig::new(vec![Equation::Flow])
}

#[test]
fn constant_solution_gives_zero_sources() {
    let zones = instances(4, flow_only(), |_| 3.5);
    let mut driver = SpectralDriver::new(zones, SpectralConfig::time_spectral(1.0)).unwrap();

    let report = driver.run(0).unwrap();

    assert_eq!(report.residuals.len(), 4);
    for zone in driver.zones() {
        let source = zone.solvers().source(Equation::Flow);
        assert_eq!(source.dim(), (3, 2));
        for value in source {
            assert_abs_diff_eq!(*value, 0.0, epsilon = 1e-12);
        }
    }
}

#[test]
fn sinusoid_gives_its_derivative() {
    let n = 5;
    let period = 2.0;
    let w = 2.0 * PI / period;
    let t = |i: usize| i as f64 * period / n as f64;

    let zones = instances(n, flow_only(), |i| (w * t(i)).sin());
    let mut driver = SpectralDriver::new(zones, SpectralConfig::time_spectral(period)).unwrap();

    driver.run(0).unwrap();

    for zone in driver.zones() {
        let i = zone.id().index();
        for value in zone.solvers().source(Equation::Flow) {
            assert_abs_diff_eq!(*value, w * (w * t(i)).cos(), epsilon = 1e-10);
        }
    }
}

#[test]
fn sources_cover_flow_and_turbulence() {
    let config = ZoneConfig::new(vec![Equation::Flow, Equation::Turbulence]);
    let zones = instances(3, config, |i| i as f64);
    let mut driver = SpectralDriver::new(zones, SpectralConfig::time_spectral(1.0)).unwrap();

    driver.run(0).unwrap();

    let operator = driver.operator().unwrap();
    let zone = &driver.zones()[ZoneId(1)];
    let expected_flow: f64 = (0..3).map(|j| operator.row(1)[j] * j as f64).sum();

    assert_abs_diff_eq!(
        zone.solvers().source(Equation::Flow)[[0, 0]],
        expected_flow,
        epsilon = 1e-12
    );
    assert_abs_diff_eq!(
        zone.solvers().source(Equation::Turbulence)[[2, 0]],
        2.0 * expected_flow,
        epsilon = 1e-12
    );
}

#[test]
fn sources_use_pre_step_solutions() {
    let zones = instances(3, flow_only(), |i| i as f64);
    let mut driver = SpectralDriver::new(zones, SpectralConfig::time_spectral(1.0)).unwrap();

    driver.run(0).unwrap();

    // Zone 0 has already marched when zone 2 advances; its source must still
    // come from the values captured before the step.
    let operator = SpectralOperator::time_spectral(1.0, 3).unwrap();
    let signals: Vec<_> = (0..3).map(|j| Array2::from_elem((3, 2), j as f64)).collect();
    let expected = operator.apply(2, &signals).unwrap();

    let source = driver.zones()[ZoneId(2)].solvers().source(Equation::Flow);
    for (a, b) in source.iter().zip(expected.iter()) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
    }
}

#[test]
fn operator_is_built_once_and_reused() {
    let zones = instances(4, flow_only(), |i| i as f64);
    let mut driver = SpectralDriver::new(zones, SpectralConfig::time_spectral(1.0)).unwrap();
    assert!(driver.operator().is_none());

    driver.run(0).unwrap();
    let first = driver.operator().cloned().unwrap();
    driver.run(1).unwrap();

    assert_eq!(driver.operator(), Some(&first));

    driver.reconfigure(SpectralConfig::time_spectral(1.0)).unwrap();
    assert_eq!(driver.operator(), Some(&first));

    driver.reconfigure(SpectralConfig::time_spectral(2.0)).unwrap();
    assert!(driver.operator().is_none());

    driver.run(2).unwrap();
    assert_eq!(driver.operator().map(SpectralOperator::period), Some(2.0));
}

#[test]
fn invalid_reconfigure_keeps_current_settings() {
    let zones = instances(4, flow_only(), |_| 0.0);
    let mut driver = SpectralDriver::new(zones, SpectralConfig::time_spectral(1.0)).unwrap();
    driver.run(0).unwrap();

    let err = driver
        .reconfigure(SpectralConfig::harmonic_balance(1.0, vec![1.0]))
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Config(ConfigError::HarmonicInstanceMismatch { .. })
    ));
    assert_eq!(driver.config().period, 1.0);
    assert!(driver.operator().is_some());
}

#[test]
fn singular_rebuild_leaves_no_operator() {
    let zones = instances(5, flow_only(), |_| 0.0);
    let mut driver = SpectralDriver::new(zones, SpectralConfig::time_spectral(1.0)).unwrap();
    driver.run(0).unwrap();

    driver
        .reconfigure(SpectralConfig::harmonic_balance(1.0, vec![4.0, 4.0]))
        .unwrap();
    let err = driver.run(1).unwrap_err();

    assert!(matches!(err, Error::SingularOperator(_)));
    assert!(driver.operator().is_none());
}

#[test]
fn moving_grid_gets_spectral_velocities() {
    let n = 4;
    let period = 0.5;
    let w = 2.0 * PI / period;
    let t = |i: usize| i as f64 * period / n as f64;

    let zones = instances(n, flow_only().with_grid_movement(), |i| (w * t(i)).cos());
    let mut driver =
        SpectralDriver::with_moving_grid(zones, SpectralConfig::time_spectral(period)).unwrap();

    driver.run(0).unwrap();

    for zone in driver.zones() {
        let i = zone.id().index();
        let velocities = zone.geometry().velocities.as_ref().unwrap();
        assert_eq!(velocities.dim(), (2, 1));
        for value in velocities {
            assert_abs_diff_eq!(*value, -w * (w * t(i)).sin(), epsilon = 1e-10);
        }
    }
}

#[test]
fn static_driver_rejects_grid_movement() {
    let zones = instances(3, flow_only().with_grid_movement(), |_| 0.0);

    let err = SpectralDriver::new(zones, SpectralConfig::time_spectral(1.0)).unwrap_err();

    assert!(matches!(err, Error::GridMovement { zone: ZoneId(0) }));
}

#[test]
fn needs_two_instances() {
    let zones = instances(1, flow_only(), |_| 0.0);

    let err = SpectralDriver::new(zones, SpectralConfig::time_spectral(1.0)).unwrap_err();

    assert!(matches!(err, Error::ZoneCount(1)));
}

#[test]
fn missing_solution_is_an_error() {
    let config = ZoneConfig::new(vec![Equation::Flow, Equation::Turbulence]);
    let mut zones = instances(3, config, |_| 1.0);
    zones[ZoneId(2)].solvers_mut().turbulence = None;
    let mut driver = SpectralDriver::new(zones, SpectralConfig::time_spectral(1.0)).unwrap();

    let err = driver.run(0).unwrap_err();

    assert!(matches!(
        err,
        Error::MissingSolution {
            zone: ZoneId(2),
            equation: Equation::Turbulence
        }
    ));
}

#[test]
fn mismatched_snapshots_are_an_error() {
    let mut zones = instances(3, flow_only(), |_| 1.0);
    zones[ZoneId(1)].solvers_mut().flow = Array2::zeros((4, 2));
    let mut driver = SpectralDriver::new(zones, SpectralConfig::time_spectral(1.0)).unwrap();

    let err = driver.run(0).unwrap_err();

    assert!(matches!(
        err,
        Error::SnapshotShape {
            zone: ZoneId(1),
            expected: (3, 2),
            found: (4, 2),
            ..
        }
    ));
}

#[test]
fn adjoint_uses_transposed_operator() {
    let omega = vec![2.0 * PI, 5.0];
    let config = SpectralConfig::harmonic_balance(1.0, omega).with_adjoint();
    let zones = instances(5, flow_only(), |i| (i * i) as f64);
    let mut driver = SpectralDriver::new(zones, config).unwrap();

    driver.run(0).unwrap();

    let operator = driver.operator().unwrap();
    let d = operator.matrix();
    for zone in driver.zones() {
        let i = zone.id().index();
        let expected: f64 = (0..5).map(|j| -d[[j, i]] * (j * j) as f64).sum();
        assert_abs_diff_eq!(
            zone.solvers().source(Equation::Flow)[[1, 1]],
            expected,
            epsilon = 1e-9
        );
    }
}

#[test]
fn zone_failure_keeps_cached_operator() {
    let mut zones = instances(3, flow_only(), |_| 1.0);
    zones[ZoneId(1)].solvers_mut().diverge = true;
    let mut driver = SpectralDriver::new(zones, SpectralConfig::time_spectral(1.0)).unwrap();

    let err = driver.run(0).unwrap_err();

    assert!(matches!(
        err,
        Error::Zone(ZoneError {
            zone: ZoneId(1),
            ..
        })
    ));
    assert!(driver.operator().is_some());
    assert_eq!(driver.kind(), tandem_core::DriverKind::Spectral);
    assert_eq!(driver.n_zones(), 3);
}
