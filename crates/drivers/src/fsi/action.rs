/// Actions an observer can take during the coupling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop iterating and leave the step uncommitted.
    StopEarly,
}
