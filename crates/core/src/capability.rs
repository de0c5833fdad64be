use ndarray::{Array2, ArrayView2};

use crate::config::Equation;

/// Solver states that take part in a spectral coupling.
///
/// Solutions are laid out as `(n_points, n_vars)` arrays. The driver reads
/// every instance's solution, then writes the spectral pseudo-source for the
/// same equation back with the same shape.
pub trait SpectralState {
    /// Returns the current solution for `equation`, or `None` if the
    /// equation is not active in this zone.
    fn solution(&self, equation: Equation) -> Option<ArrayView2<'_, f64>>;

    /// Stores the spectral source term to add during the next advance.
    fn set_spectral_source(&mut self, equation: Equation, source: Array2<f64>);
}

/// A geometry whose nodes move with prescribed velocities.
pub trait MovingGrid {
    /// Node coordinates as `(n_nodes, n_dim)`.
    fn coordinates(&self) -> ArrayView2<'_, f64>;

    /// Replaces the node velocities, shaped like [`coordinates`](Self::coordinates).
    fn set_grid_velocities(&mut self, velocities: Array2<f64>);
}

/// The fluid side of a fluid-structure interface.
pub trait FluidInterface {
    /// Traction at the interface nodes as `(n_interface_nodes, n_dim)`.
    fn interface_traction(&self) -> Array2<f64>;
}

/// The structural side of a fluid-structure interface.
pub trait StructuralInterface {
    /// Applies the fluid load to the interface nodes.
    fn set_interface_load(&mut self, traction: ArrayView2<'_, f64>);

    /// Current interface displacement as `(n_interface_nodes, n_dim)`.
    fn interface_displacement(&self) -> Array2<f64>;
}

/// Moves a fluid mesh so that its interface follows a prescribed displacement.
pub trait MeshDeformer<G> {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Deforms `geometry` so its interface nodes sit at `displacement`.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the mesh cannot be deformed, e.g. because
    /// of negative cell volumes.
    fn deform(
        &mut self,
        geometry: &mut G,
        displacement: ArrayView2<'_, f64>,
    ) -> Result<(), Self::Error>;
}
