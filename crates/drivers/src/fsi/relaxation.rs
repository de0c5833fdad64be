use ndarray::{Array2, ArrayView2, Zip};
use tandem_core::Relaxation;

/// Blends the imposed and computed interface displacements.
///
/// With residual `r = d_computed − d_current`, the next imposed displacement
/// is `d_current + ω r`. Aitken's method updates the factor each iteration:
///
/// ```text
/// ω_k = −ω_{k−1} · r_{k−1}·(r_k − r_{k−1}) / ‖r_k − r_{k−1}‖²
/// ```
#[derive(Debug, Clone)]
pub struct Relaxer {
    kind: Relaxation,
    factor: f64,
    previous_residual: Option<Array2<f64>>,
}

impl Relaxer {
    #[must_use]
    pub fn new(kind: Relaxation) -> Self {
        Self {
            kind,
            factor: Self::initial_factor(kind),
            previous_residual: None,
        }
    }

    fn initial_factor(kind: Relaxation) -> f64 {
        match kind {
            Relaxation::Off => 1.0,
            Relaxation::Fixed { factor } => factor,
            Relaxation::Aitken { initial } => initial,
        }
    }

    /// Returns the factor used by the most recent [`relax`](Self::relax).
    #[must_use]
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Forgets the iteration history at the start of an outer step.
    pub fn reset(&mut self) {
        self.factor = Self::initial_factor(self.kind);
        self.previous_residual = None;
    }

    /// Returns the displacement to impose next.
    ///
    /// Both arrays must have the same shape.
    pub fn relax(
        &mut self,
        current: ArrayView2<'_, f64>,
        computed: ArrayView2<'_, f64>,
    ) -> Array2<f64> {
        let residual = &computed - &current;

        if let Relaxation::Aitken { .. } = self.kind {
            if let Some(previous) = self.previous_residual.as_ref() {
                self.factor = aitken(self.factor, previous, &residual);
            }
            self.previous_residual = Some(residual.clone());
        }

        let mut relaxed = current.to_owned();
        relaxed.scaled_add(self.factor, &residual);
        relaxed
    }
}

/// A non-finite update keeps the previous factor.
fn aitken(factor: f64, previous: &Array2<f64>, residual: &Array2<f64>) -> f64 {
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    Zip::from(previous).and(residual).for_each(|&r0, &r1| {
        let diff = r1 - r0;
        numerator += r0 * diff;
        denominator += diff * diff;
    });

    let next = -factor * numerator / denominator;
    if next.is_finite() { next } else { factor }
}
