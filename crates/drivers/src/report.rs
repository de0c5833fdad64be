use tandem_core::ZoneId;

/// Per-zone residuals of one completed outer step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// The outer step that was run.
    pub step: usize,

    /// Convergence metric of each zone, in zone-index order.
    pub residuals: Vec<f64>,
}

impl StepReport {
    /// Returns the residual of `zone`, if it exists.
    #[must_use]
    pub fn residual(&self, zone: ZoneId) -> Option<f64> {
        self.residuals.get(zone.index()).copied()
    }

    /// Returns the largest residual, or `None` if there are no zones.
    ///
    /// A NaN residual is returned as NaN.
    #[must_use]
    pub fn max_residual(&self) -> Option<f64> {
        self.residuals.iter().copied().reduce(|max, r| {
            if r.is_nan() || max.is_nan() {
                f64::NAN
            } else {
                max.max(r)
            }
        })
    }
}
