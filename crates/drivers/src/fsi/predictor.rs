use std::collections::VecDeque;

use ndarray::Array2;
use tandem_core::Predictor;

const DEPTH: usize = 3;

/// Interface displacements of the most recently committed steps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplacementHistory {
    // Newest first.
    steps: VecDeque<Array2<f64>>,
}

impl DisplacementHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a committed displacement, dropping the oldest beyond three.
    pub fn push(&mut self, displacement: Array2<f64>) {
        self.steps.push_front(displacement);
        self.steps.truncate(DEPTH);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns the displacement committed `back` steps ago, 0 being the latest.
    #[must_use]
    pub fn get(&self, back: usize) -> Option<&Array2<f64>> {
        self.steps.get(back)
    }

    /// Extrapolates the next step's displacement.
    ///
    /// Falls back to a lower order when the history is too short. Returns
    /// `None` when prediction is off or there is no history.
    #[must_use]
    pub fn predict(&self, predictor: Predictor) -> Option<Array2<f64>> {
        let order = match predictor {
            Predictor::Off => return None,
            Predictor::Linear => 1,
            Predictor::Quadratic => 2,
        };

        match (order.min(self.len().saturating_sub(1)), self.len()) {
            (_, 0) => None,
            (0, _) => self.get(0).cloned(),
            (1, _) => {
                let (d0, d1) = (self.get(0)?, self.get(1)?);
                Some(d0 * 2.0 - d1)
            }
            _ => {
                let (d0, d1, d2) = (self.get(0)?, self.get(1)?, self.get(2)?);
                Some((d0 - d1) * 3.0 + d2)
            }
        }
    }
}
