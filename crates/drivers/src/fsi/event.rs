/// Event emitted after every coupling iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    /// The outer step being coupled.
    pub step: usize,

    /// Coupling iteration within the step, starting at 1.
    pub iter: usize,

    /// `‖d_computed − d_current‖₂` for this iteration.
    pub delta_norm: f64,

    /// Relaxation factor applied to the displacement update.
    pub relaxation: f64,
}
