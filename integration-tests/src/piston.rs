use ndarray::{Array2, ArrayView2};
use tandem_core::{
    Equation, FluidInterface, FsiConfig, Integration, MeshDeformer, StructuralInterface, Zone,
    ZoneConfig, ZoneId,
};
use tandem_drivers::{FsiDriver, fsi};
use thiserror::Error;

/// Number of interface nodes on the piston face.
pub const FACE_NODES: usize = 3;

/// Interface node positions seen by the gas.
#[derive(Debug)]
pub struct Face {
    pub position: Array2<f64>,
}

#[derive(Debug)]
pub struct Gas {
    pub traction: Array2<f64>,
}

impl FluidInterface for Gas {
    fn interface_traction(&self) -> Array2<f64> {
        self.traction.clone()
    }
}

#[derive(Debug, Error)]
#[error("gas model never fails")]
pub struct NeverFails;

/// Gas pressure `p0 + ramp·step − stiffness·d` at each face node.
#[derive(Debug)]
pub struct GasModel {
    pub p0: f64,
    pub ramp: f64,
    pub stiffness: f64,
    pub advances: usize,
    pub commits: usize,
}

impl Integration for GasModel {
    type Geometry = Face;
    type Solvers = Gas;
    type Numerics = ();
    type Error = NeverFails;

    fn advance(
        &mut self,
        face: &mut Face,
        gas: &mut Gas,
        _numerics: &(),
        _config: &ZoneConfig,
        step: usize,
    ) -> Result<f64, NeverFails> {
        self.advances += 1;
        let pressure = self.p0 + self.ramp * step as f64;
        gas.traction = face.position.mapv(|d| pressure - self.stiffness * d);
        Ok(0.0)
    }

    fn update(
        &mut self,
        _face: &mut Face,
        _gas: &mut Gas,
        _numerics: &(),
        _config: &ZoneConfig,
        _step: usize,
    ) -> Result<(), NeverFails> {
        self.commits += 1;
        Ok(())
    }
}

#[derive(Debug)]
pub struct Spring {
    pub load: Array2<f64>,
    pub displacement: Array2<f64>,
}

impl StructuralInterface for Spring {
    fn set_interface_load(&mut self, traction: ArrayView2<'_, f64>) {
        self.load = traction.to_owned();
    }

    fn interface_displacement(&self) -> Array2<f64> {
        self.displacement.clone()
    }
}

/// Linear spring `d = load / stiffness`.
#[derive(Debug)]
pub struct SpringModel {
    pub stiffness: f64,
    pub commits: usize,
}

impl Integration for SpringModel {
    type Geometry = ();
    type Solvers = Spring;
    type Numerics = ();
    type Error = NeverFails;

    fn advance(
        &mut self,
        _geometry: &mut (),
        spring: &mut Spring,
        _numerics: &(),
        _config: &ZoneConfig,
        _step: usize,
    ) -> Result<f64, NeverFails> {
        spring.displacement = spring.load.mapv(|f| f / self.stiffness);
        Ok(0.0)
    }

    fn update(
        &mut self,
        _geometry: &mut (),
        _spring: &mut Spring,
        _numerics: &(),
        _config: &ZoneConfig,
        _step: usize,
    ) -> Result<(), NeverFails> {
        self.commits += 1;
        Ok(())
    }
}

#[derive(Debug, Error)]
#[error("piston left the cylinder at d = {0}")]
pub struct OutOfStroke(pub f64);

/// Moves the face nodes rigidly, refusing positions beyond `stroke`.
#[derive(Debug)]
pub struct Stroke {
    pub stroke: f64,
    pub calls: usize,
}

impl MeshDeformer<Face> for Stroke {
    type Error = OutOfStroke;

    fn deform(
        &mut self,
        face: &mut Face,
        displacement: ArrayView2<'_, f64>,
    ) -> Result<(), OutOfStroke> {
        self.calls += 1;
        if let Some(&d) = displacement.iter().find(|d| d.abs() > self.stroke) {
            return Err(OutOfStroke(d));
        }
        face.position.assign(&displacement);
        Ok(())
    }
}

pub type PistonDriver = FsiDriver<GasModel, SpringModel, Stroke>;

/// Settings of the piston problem.
#[derive(Debug, Clone, Copy)]
pub struct Piston {
    pub p0: f64,
    pub ramp: f64,
    pub gas_stiffness: f64,
    pub spring_stiffness: f64,
    pub stroke: f64,
}

impl Default for Piston {
    fn default() -> Self {
        Self {
            p0: 1.0,
            ramp: 0.0,
            gas_stiffness: 0.5,
            spring_stiffness: 2.0,
            stroke: 100.0,
        }
    }
}

impl Piston {
    /// Returns the coupled equilibrium displacement at `step`.
    #[must_use]
    pub fn equilibrium(&self, step: usize) -> f64 {
        (self.p0 + self.ramp * step as f64) / (self.spring_stiffness + self.gas_stiffness)
    }

    /// Builds the FSI driver for this problem.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn driver(&self, config: FsiConfig) -> Result<PistonDriver, fsi::Error> {
        let flow = Zone::new(
            ZoneId(0),
            ZoneConfig::new(vec![Equation::Flow]).named("gas"),
            Face {
                position: Array2::zeros((FACE_NODES, 1)),
            },
            Gas {
                traction: Array2::zeros((FACE_NODES, 1)),
            },
            GasModel {
                p0: self.p0,
                ramp: self.ramp,
                stiffness: self.gas_stiffness,
                advances: 0,
                commits: 0,
            },
            (),
        );
        let structure = Zone::new(
            ZoneId(1),
            ZoneConfig::new(vec![Equation::Structural]).named("piston"),
            (),
            Spring {
                load: Array2::zeros((FACE_NODES, 1)),
                displacement: Array2::zeros((FACE_NODES, 1)),
            },
            SpringModel {
                stiffness: self.spring_stiffness,
                commits: 0,
            },
            (),
        );
        let deformer = Stroke {
            stroke: self.stroke,
            calls: 0,
        };
        FsiDriver::new(flow, structure, deformer, config)
    }
}
