use ndarray::Array2;

use super::solution::{Solution, Status};

/// Interface state of one coupling loop.
#[derive(Debug)]
pub(super) struct CouplingState {
    pub traction: Array2<f64>,
    pub displacement: Array2<f64>,
    pub delta_norm: f64,
    pub iter: usize,
    pub converged: bool,
}

impl CouplingState {
    pub(super) fn new(displacement: Array2<f64>) -> Self {
        Self {
            traction: Array2::zeros(displacement.raw_dim()),
            displacement,
            delta_norm: f64::INFINITY,
            iter: 0,
            converged: false,
        }
    }

    /// Records a completed iteration.
    pub(super) fn record(
        &mut self,
        iter: usize,
        traction: Array2<f64>,
        displacement: Array2<f64>,
        delta_norm: f64,
    ) {
        self.iter = iter;
        self.traction = traction;
        self.displacement = displacement;
        self.delta_norm = delta_norm;
    }

    pub(super) fn into_solution(self, status: Status, committed: bool) -> Solution {
        Solution {
            status,
            iters: self.iter,
            delta_norm: self.delta_norm,
            displacement: self.displacement,
            traction: self.traction,
            committed,
        }
    }
}
