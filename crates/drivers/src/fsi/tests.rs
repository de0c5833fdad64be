use approx::assert_relative_eq;
use ndarray::{Array2, ArrayView2, array};
use tandem_core::{
    ConfigError, DriverKind, Equation, FluidInterface, FsiConfig, Integration, MeshDeformer,
    Predictor, Relaxation, StructuralInterface, Zone, ZoneConfig, ZoneId,
};
use thiserror::Error;

use crate::Driver;

use super::{Action, Error, Event, FsiDriver, Status};

/// A piston face whose position is the interface displacement.
#[derive(Debug)]
struct Piston {
    position: Array2<f64>,
}

/// Gas pressure on the piston drops linearly as it moves out.
#[derive(Debug)]
struct Gas {
    traction: Array2<f64>,
}

impl FluidInterface for Gas {
    fn interface_traction(&self) -> Array2<f64> {
        self.traction.clone()
    }
}

/// Pressure `p0 + ramp·step − stiffness·d`.
#[derive(Debug)]
struct GasModel {
    p0: f64,
    ramp: f64,
    stiffness: f64,
    updates: usize,
}

#[derive(Debug, Error)]
#[error("never fails")]
struct Never;

impl Integration for GasModel {
    type Geometry = Piston;
    type Solvers = Gas;
    type Numerics = ();
    type Error = Never;

    fn advance(
        &mut self,
        piston: &mut Piston,
        gas: &mut Gas,
        _: &(),
        _: &ZoneConfig,
        step: usize,
    ) -> Result<f64, Never> {
        let pressure = self.p0 + self.ramp * step as f64;
        gas.traction = piston.position.mapv(|d| pressure - self.stiffness * d);
        Ok(0.0)
    }

    fn update(&mut self, _: &mut Piston, _: &mut Gas, _: &(), _: &ZoneConfig, _: usize) -> Result<(), Never> {
        self.updates += 1;
        Ok(())
    }
}

#[derive(Debug)]
struct Spring {
    load: Array2<f64>,
    displacement: Array2<f64>,
}

impl StructuralInterface for Spring {
    fn set_interface_load(&mut self, traction: ArrayView2<'_, f64>) {
        self.load = traction.to_owned();
    }

    fn interface_displacement(&self) -> Array2<f64> {
        self.displacement.clone()
    }
}

/// Linear spring: `d = load / stiffness`.
#[derive(Debug)]
struct SpringModel {
    stiffness: f64,
    updates: usize,
}

impl Integration for SpringModel {
    type Geometry = ();
    type Solvers = Spring;
    type Numerics = ();
    type Error = Never;

    fn advance(
        &mut self,
        _: &mut (),
        spring: &mut Spring,
        _: &(),
        _: &ZoneConfig,
        _: usize,
    ) -> Result<f64, Never> {
        spring.displacement = spring.load.mapv(|f| f / self.stiffness);
        Ok(0.0)
    }

    fn update(&mut self, _: &mut (), _: &mut Spring, _: &(), _: &ZoneConfig, _: usize) -> Result<(), Never> {
        self.updates += 1;
        Ok(())
    }
}

#[derive(Debug, Error)]
#[error("negative cell volume")]
struct NegativeVolume;

/// Moves the piston face; fails once the face passes `limit`.
#[derive(Debug, Default)]
struct Mover {
    calls: usize,
    limit: Option<f64>,
}

impl MeshDeformer<Piston> for Mover {
    type Error = NegativeVolume;

    fn deform(
        &mut self,
        piston: &mut Piston,
        displacement: ArrayView2<'_, f64>,
    ) -> Result<(), NegativeVolume> {
        self.calls += 1;
        if let Some(limit) = self.limit {
            if displacement.iter().any(|d| *d > limit) {
                return Err(NegativeVolume);
            }
        }
        piston.position.assign(&displacement);
        Ok(())
    }
}

type PistonDriver = FsiDriver<GasModel, SpringModel, Mover>;

fn driver(gas_stiffness: f64, spring_stiffness: f64, config: FsiConfig) -> PistonDriver {
    driver_with(gas_stiffness, spring_stiffness, config, Mover::default())
}

fn driver_with(
    gas_stiffness: f64,
    spring_stiffness: f64,
    config: FsiConfig,
    mover: Mover,
) -> PistonDriver {
    let flow = Zone::new(
        ZoneId(0),
        ZoneConfig::new(vec![Equation::Flow]),
        Piston {
            position: Array2::zeros((2, 1)),
        },
        Gas {
            traction: Array2::zeros((2, 1)),
        },
        GasModel {
            p0: 1.0,
            ramp: 0.0,
            stiffness: gas_stiffness,
            updates: 0,
        },
        (),
    );
    let structure = Zone::new(
        ZoneId(1),
        ZoneConfig::new(vec![Equation::Structural]),
        (),
        Spring {
            load: Array2::zeros((2, 1)),
            displacement: Array2::zeros((2, 1)),
        },
        SpringModel {
            stiffness: spring_stiffness,
            updates: 0,
        },
        (),
    );
    FsiDriver::new(flow, structure, mover, config).unwrap()
}

fn config(tolerance: f64, max_iters: usize) -> FsiConfig {
    FsiConfig::new(tolerance, max_iters).unwrap()
}

#[test]
fn converges_to_spring_equilibrium() {
    // d = (1 - 0.5 d) / 2, so d = 0.4.
    let mut driver = driver(0.5, 2.0, config(1e-10, 50));

    let solution = driver.run(0).unwrap();

    assert_eq!(solution.status, Status::Converged);
    assert!(solution.is_converged());
    assert!(solution.committed);
    assert!(solution.delta_norm <= 1e-10);
    for d in &solution.displacement {
        assert_relative_eq!(*d, 0.4, epsilon = 1e-9);
    }
    for t in &solution.traction {
        assert_relative_eq!(*t, 0.8, epsilon = 1e-9);
    }
    assert_eq!(driver.flow().integration().updates, 1);
    assert_eq!(driver.structure().integration().updates, 1);
    assert_eq!(driver.history().len(), 1);
    assert_eq!(driver.deformer().calls, solution.iters);
}

#[test]
fn respects_tolerance_and_cap() {
    let mut driver = driver(0.5, 2.0, config(1e-6, 20));

    let solution = driver.run(0).unwrap();

    assert!(solution.iters <= 20);
    if solution.is_converged() {
        assert!(solution.delta_norm < 1e-6);
    }
}

#[test]
fn unstable_coupling_hits_the_cap() {
    // The gas is stiffer than the spring, so plain Gauss-Seidel diverges.
    let mut driver = driver(3.0, 1.0, config(1e-8, 12));

    let solution = driver.run(4).unwrap();

    assert_eq!(solution.status, Status::MaxIters);
    assert_eq!(solution.iters, 12);
    assert!(!solution.is_converged());
    assert!(!solution.committed);
    assert_eq!(driver.flow().integration().updates, 0);
    assert!(driver.history().is_empty());

    driver.commit(4).unwrap();

    assert_eq!(driver.flow().integration().updates, 1);
    assert_eq!(driver.structure().integration().updates, 1);
    assert_eq!(driver.history().get(0), Some(&solution.displacement));
}

#[test]
fn fixed_relaxation_stabilizes_stiff_coupling() {
    let config = config(1e-10, 100).with_relaxation(Relaxation::Fixed { factor: 0.2 });
    let mut driver = driver(3.0, 1.0, config);

    let solution = driver.run(0).unwrap();

    assert!(solution.is_converged());
    assert_relative_eq!(solution.displacement[[0, 0]], 0.25, epsilon = 1e-9);
}

#[test]
fn aitken_needs_fewer_iterations_than_fixed() {
    let fixed = config(1e-10, 100).with_relaxation(Relaxation::Fixed { factor: 0.2 });
    let aitken = config(1e-10, 100).with_relaxation(Relaxation::Aitken { initial: 0.2 });

    let fixed = driver(3.0, 1.0, fixed).run(0).unwrap();
    let aitken = driver(3.0, 1.0, aitken).run(0).unwrap();

    assert!(fixed.is_converged());
    assert!(aitken.is_converged());
    assert!(aitken.iters < fixed.iters);
}

#[test]
fn observer_sees_every_iteration_and_can_stop() {
    let mut driver = driver(0.5, 2.0, config(1e-12, 50));
    let mut events: Vec<Event> = Vec::new();

    let solution = driver
        .run_observed(3, |event: &Event| {
            events.push(*event);
            (event.iter == 3).then_some(Action::StopEarly)
        })
        .unwrap();

    assert_eq!(solution.status, Status::StoppedByObserver);
    assert_eq!(solution.iters, 3);
    assert_eq!(events.iter().map(|e| e.iter).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert!(events.iter().all(|e| e.step == 3 && e.relaxation == 1.0));
    assert!(events[2].delta_norm < events[0].delta_norm);
    assert_eq!(events[2].delta_norm, solution.delta_norm);

    // A stopped step is left for the caller to accept or discard.
    assert!(!solution.committed);
    assert_eq!(driver.flow().integration().updates, 0);
    assert!(driver.history().is_empty());

    driver.commit(3).unwrap();

    assert_eq!(driver.structure().integration().updates, 1);
    assert_eq!(driver.history().get(0), Some(&solution.displacement));
}

#[test]
fn converging_iteration_wins_over_a_stop_request() {
    // Without gas stiffness the second iteration reproduces the first.
    let mut driver = driver(0.0, 2.0, config(1e-12, 10));
    let mut seen = 0;

    let solution = driver
        .run_observed(0, |event: &Event| {
            seen += 1;
            (event.iter == 2).then_some(Action::StopEarly)
        })
        .unwrap();

    assert_eq!(solution.status, Status::Converged);
    assert_eq!(solution.iters, 2);
    assert_eq!(seen, 2);
    assert!(solution.committed);
    assert_eq!(driver.flow().integration().updates, 1);
}

#[test]
fn delta_equal_to_tolerance_is_not_converged() {
    // First iteration moves both nodes from 0 to 0.5.
    let first_delta = (0.25_f64 + 0.25).sqrt();
    let mut driver = driver(0.0, 2.0, config(first_delta, 10));

    let solution = driver.run(0).unwrap();

    assert_eq!(solution.status, Status::Converged);
    assert_eq!(solution.iters, 2);
    assert_eq!(solution.delta_norm, 0.0);
}

#[test]
fn linear_predictor_starts_closer() {
    let run_steps = |predictor: Predictor| {
        let mut driver = driver(0.5, 2.0, config(1e-8, 50).with_predictor(predictor));
        driver.flow_mut().integration_mut().ramp = 1.0;
        let mut first_deltas = Vec::new();
        for step in 0..3 {
            let mut first = None;
            let solution = driver
                .run_observed(step, |event: &Event| {
                    first.get_or_insert(event.delta_norm);
                    None::<Action>
                })
                .unwrap();
            assert!(solution.is_converged());
            first_deltas.push(first.unwrap());
        }
        first_deltas
    };

    let plain = run_steps(Predictor::Off);
    let predicted = run_steps(Predictor::Linear);

    // The equilibrium moves linearly with the step, so by step 2 the linear
    // guess is nearly exact.
    assert!(predicted[2] < 1e-6);
    assert!(predicted[2] < 1e-3 * plain[2]);
}

#[test]
fn checks_zone_roles() {
    let flow = Zone::new(
        ZoneId(0),
        ZoneConfig::new(vec![Equation::Structural]),
        Piston {
            position: Array2::zeros((1, 1)),
        },
        Gas {
            traction: Array2::zeros((1, 1)),
        },
        GasModel {
            p0: 1.0,
            ramp: 0.0,
            stiffness: 1.0,
            updates: 0,
        },
        (),
    );
    let structure = Zone::new(
        ZoneId(1),
        ZoneConfig::new(vec![Equation::Structural]),
        (),
        Spring {
            load: Array2::zeros((1, 1)),
            displacement: Array2::zeros((1, 1)),
        },
        SpringModel {
            stiffness: 1.0,
            updates: 0,
        },
        (),
    );

    let err = FsiDriver::new(flow, structure, Mover::default(), FsiConfig::default()).unwrap_err();

    assert!(matches!(
        err,
        Error::Config(ConfigError::MissingEquation {
            zone: 0,
            equation: Equation::Flow
        })
    ));
}

#[test]
fn interface_shape_mismatch_is_an_error() {
    let mut driver = driver(0.5, 2.0, config(1e-8, 10));
    driver.flow_mut().geometry_mut().position = array![[0.0], [0.0], [0.0]];

    let err = driver.run(0).unwrap_err();

    assert!(matches!(
        err,
        Error::InterfaceShape {
            quantity: "traction",
            expected: (2, 1),
            found: (3, 1),
        }
    ));
}

#[test]
fn deformer_failure_is_propagated() {
    let mover = Mover {
        calls: 0,
        limit: Some(5.0),
    };
    let mut driver = driver_with(3.0, 1.0, config(1e-8, 20), mover);

    let err = driver.run(0).unwrap_err();

    assert!(matches!(err, Error::Deform(_)));
    assert_eq!(err.to_string(), "mesh deformation failed: negative cell volume");
    assert_eq!(driver.flow().integration().updates, 0);
}

#[test]
fn driver_contract() {
    let driver = driver(0.5, 2.0, FsiConfig::default());

    assert_eq!(driver.kind(), DriverKind::Fsi);
    assert_eq!(driver.n_zones(), 2);
}
