use tandem_core::Observer;

use crate::traits::{HasIteration, HasResidual};

/// Records the residual of every iteration.
///
/// Pass `&mut ResidualHistory` as the observer to read the record after the
/// run. Iteration counters restart with each outer step, so use
/// [`clear`](Self::clear) between steps when only the latest is of interest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResidualHistory {
    points: Vec<(usize, f64)>,
}

impl ResidualHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `(iteration, residual)` pairs in the order observed.
    #[must_use]
    pub fn points(&self) -> &[(usize, f64)] {
        &self.points
    }

    /// Returns the residuals in the order observed.
    pub fn residuals(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|(_, r)| *r)
    }

    #[must_use]
    pub fn last(&self) -> Option<f64> {
        self.points.last().map(|(_, r)| *r)
    }

    /// Returns the mean ratio between successive residuals.
    ///
    /// Values below one indicate convergence. Returns `None` with fewer than
    /// two finite, non-zero residuals.
    #[must_use]
    pub fn convergence_rate(&self) -> Option<f64> {
        let ratios: Vec<f64> = self
            .points
            .windows(2)
            .map(|pair| pair[1].1 / pair[0].1)
            .filter(|ratio| ratio.is_finite() && *ratio > 0.0)
            .collect();
        if ratios.is_empty() {
            return None;
        }
        let log_mean = ratios.iter().map(|r| r.ln()).sum::<f64>() / ratios.len() as f64;
        Some(log_mean.exp())
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

impl<E, A> Observer<E, A> for ResidualHistory
where
    E: HasResidual + HasIteration,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self.points.push((event.iteration(), event.residual()));
        None
    }
}

impl<E, A> Observer<E, A> for &mut ResidualHistory
where
    E: HasResidual + HasIteration,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        (**self).observe(event)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use tandem_drivers::fsi::{Action, Event};

    use super::*;

    fn event(iter: usize, delta_norm: f64) -> Event {
        Event {
            step: 0,
            iter,
            delta_norm,
            relaxation: 1.0,
        }
    }

    fn feed(history: &mut ResidualHistory, event: Event) {
        let action: Option<Action> = history.observe(&event);
        assert!(action.is_none());
    }

    #[test]
    fn records_in_order() {
        let mut history = ResidualHistory::new();
        feed(&mut history, event(1, 1.0));
        feed(&mut history, event(2, 0.1));

        assert_eq!(history.points(), [(1, 1.0), (2, 0.1)]);
        assert_eq!(history.last(), Some(0.1));
    }

    #[test]
    fn geometric_rate() {
        let mut history = ResidualHistory::new();
        for (i, r) in [1.0, 0.25, 0.0625, 0.015625].into_iter().enumerate() {
            feed(&mut history, event(i + 1, r));
        }

        assert_relative_eq!(history.convergence_rate().unwrap(), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn rate_needs_two_points() {
        let mut history = ResidualHistory::new();
        assert!(history.convergence_rate().is_none());

        feed(&mut history, event(1, 1.0));
        assert!(history.convergence_rate().is_none());

        history.clear();
        assert!(history.points().is_empty());
    }
}
