use ndarray::Array2;

/// Indicates how the coupling loop terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The displacement delta fell below the tolerance.
    Converged,

    /// Reached the iteration limit without converging.
    MaxIters,

    /// Stopped early due to an observer decision.
    StoppedByObserver,
}

/// The result of one coupled outer step.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// How the coupling loop terminated.
    pub status: Status,

    /// Number of coupling iterations performed.
    pub iters: usize,

    /// Displacement delta norm of the last iteration.
    pub delta_norm: f64,

    /// Interface displacement imposed on the flow mesh.
    pub displacement: Array2<f64>,

    /// Interface traction from the last flow solve.
    pub traction: Array2<f64>,

    /// Whether both zones were updated and the step recorded.
    ///
    /// Only [`Status::Converged`] steps are committed by the driver; see
    /// [`FsiDriver::commit`](super::FsiDriver::commit) for the others.
    pub committed: bool,
}

impl Solution {
    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.status == Status::Converged
    }
}
