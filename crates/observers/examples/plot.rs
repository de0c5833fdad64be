//! Interactive view of a Block Gauss-Seidel coupling loop.
//!
//! A gas-filled cylinder pushes on a piston held by a linear spring. The gas
//! pressure drops as the piston moves out, and the fill pressure ramps up
//! each step. With a gas stiffer than the spring, plain Gauss-Seidel
//! diverges; relaxation brings it back.
//!
//! # Usage
//!
//! ```text
//! cargo run -p tandem-observers --example plot --features plot -- aitken
//! cargo run -p tandem-observers --example plot --features plot -- fixed 0.2
//! ```
//!
//! The window shows the interface delta norm and relaxation factor of every
//! coupling iteration, step after step.

use std::{convert::Infallible, error::Error};

use ndarray::{Array2, ArrayView2};
use tandem_core::{
    Equation, FluidInterface, FsiConfig, Integration, MeshDeformer, Observer, Relaxation,
    StructuralInterface, Zone, ZoneConfig, ZoneId,
};
use tandem_drivers::{FsiDriver, fsi};
use tandem_observers::{DivergenceGuard, PlotObserver, ShowConfig};

const STEPS: usize = 8;

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let relaxation = match args.next().as_deref().unwrap_or("aitken") {
        "aitken" => Relaxation::Aitken { initial: 0.5 },
        "fixed" => {
            let factor = args.next().as_deref().unwrap_or("0.2").parse()?;
            Relaxation::Fixed { factor }
        }
        "off" => Relaxation::Off,
        other => {
            eprintln!("Unknown relaxation: {other}");
            eprintln!("Usage: plot [aitken|fixed [factor]|off]");
            std::process::exit(1);
        }
    };

    let config = FsiConfig::new(1e-10, 60)?.with_relaxation(relaxation);
    let mut driver = piston(3.0, 1.0, config)?;

    let mut plot = PlotObserver::<2>::new(["delta norm", "relaxation"]);
    let mut guard = DivergenceGuard::default();

    for step in 0..STEPS {
        guard.reset();
        let solution = driver.run_observed(step, |event: &fsi::Event| {
            let _: Option<fsi::Action> = plot.observe(event);
            let stop: Option<fsi::Action> = guard.observe(event);
            stop
        })?;
        println!(
            "step {step}: {:?} after {} iterations, d = {:.6}",
            solution.status,
            solution.iters,
            solution.displacement[[0, 0]],
        );
        match solution.status {
            fsi::Status::Converged => {}
            fsi::Status::MaxIters => driver.commit(step)?,
            fsi::Status::StoppedByObserver => {
                println!("coupling diverged, plotting what ran so far");
                break;
            }
        }
    }

    plot.show(
        ShowConfig::new()
            .title(format!("Piston coupling with {relaxation:?}"))
            .legend()
            .log_y(),
    )?;

    Ok(())
}

// --- Piston model ------------------------------------------------------------

#[derive(Debug)]
struct Face {
    position: Array2<f64>,
}

#[derive(Debug)]
struct Gas {
    traction: Array2<f64>,
}

impl FluidInterface for Gas {
    fn interface_traction(&self) -> Array2<f64> {
        self.traction.clone()
    }
}

/// Pressure `1 + 0.1·step − stiffness·d`.
struct GasModel {
    stiffness: f64,
}

impl Integration for GasModel {
    type Geometry = Face;
    type Solvers = Gas;
    type Numerics = ();
    type Error = Infallible;

    fn advance(
        &mut self,
        face: &mut Face,
        gas: &mut Gas,
        _numerics: &(),
        _config: &ZoneConfig,
        step: usize,
    ) -> Result<f64, Infallible> {
        let pressure = 1.0 + 0.1 * step as f64;
        gas.traction = face.position.mapv(|d| pressure - self.stiffness * d);
        Ok(0.0)
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

struct SpringModel {
    stiffness: f64,
}

impl Integration for SpringModel {
    type Geometry = ();
    type Solvers = Spring;
    type Numerics = ();
    type Error = Infallible;

    fn advance(
        &mut self,
        _geometry: &mut (),
        spring: &mut Spring,
        _numerics: &(),
        _config: &ZoneConfig,
        _step: usize,
    ) -> Result<f64, Infallible> {
        spring.displacement = spring.load.mapv(|f| f / self.stiffness);
        Ok(0.0)
    }
}

/// Moves the piston face rigidly.
struct Rigid;

impl MeshDeformer<Face> for Rigid {
    type Error = Infallible;

    fn deform(&mut self, face: &mut Face, displacement: ArrayView2<'_, f64>) -> Result<(), Infallible> {
        face.position.assign(&displacement);
        Ok(())
    }
}

fn piston(
    gas_stiffness: f64,
    spring_stiffness: f64,
    config: FsiConfig,
) -> Result<FsiDriver<GasModel, SpringModel, Rigid>, fsi::Error> {
    let flow = Zone::new(
        ZoneId(0),
        ZoneConfig::new(vec![Equation::Flow]).named("gas"),
        Face {
            position: Array2::zeros((1, 1)),
        },
        Gas {
            traction: Array2::zeros((1, 1)),
        },
        GasModel {
            stiffness: gas_stiffness,
        },
        (),
    );
    let structure = Zone::new(
        ZoneId(1),
        ZoneConfig::new(vec![Equation::Structural]).named("spring"),
        (),
        Spring {
            load: Array2::zeros((1, 1)),
            displacement: Array2::zeros((1, 1)),
        },
        SpringModel {
            stiffness: spring_stiffness,
        },
        (),
    );
    FsiDriver::new(flow, structure, Rigid, config)
}
