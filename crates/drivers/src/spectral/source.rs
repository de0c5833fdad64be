use ndarray::Array2;
use tandem_core::{Integration, MovingGrid, SpectralState, ZoneId, ZoneSet};

use super::history::check_order;
use super::{Error, SolutionHistory, SpectralOperator};

/// Computes and stores the spectral source terms of one zone.
///
/// For each equation in `history` the source is `Σ_j D[zone][j] · U_j`, or
/// `Σ_j -D[j][zone] · U_j` when `adjoint` is set.
///
/// # Errors
///
/// Returns an error if the history does not hold one snapshot per operator
/// instance or if `zone` is out of range.
pub fn set_spectral_method<S: SpectralState>(
    operator: &SpectralOperator,
    history: &SolutionHistory,
    zone: ZoneId,
    solvers: &mut S,
    adjoint: bool,
) -> Result<(), Error> {
    for equation in history.equations() {
        let Some(snapshots) = history.snapshots(equation) else {
            continue;
        };
        let source = if adjoint {
            operator.apply_adjoint(zone.index(), snapshots)?
        } else {
            operator.apply(zone.index(), snapshots)?
        };
        solvers.set_spectral_source(equation, source);
    }
    Ok(())
}

/// Sets every zone's grid velocities to the spectral derivative of the mesh
/// coordinates, `Σ_j D[i][j] · X_j`.
///
/// All coordinates are copied before any velocity is written.
///
/// # Errors
///
/// Returns [`Error::ZoneOrder`] if a zone has moved away from its index,
/// [`Error::CoordinateShape`] if the zones' meshes differ in shape, or an
/// operator error if the zone count does not match the operator.
pub fn set_time_spectral_velocities<I>(
    operator: &SpectralOperator,
    zones: &mut ZoneSet<I>,
) -> Result<(), Error>
where
    I: Integration,
    I::Geometry: MovingGrid,
{
    check_order(zones)?;

    let coordinates: Vec<Array2<f64>> = zones
        .iter()
        .map(|zone| zone.geometry().coordinates().to_owned())
        .collect();

    if let Some(first) = coordinates.first() {
        let expected = first.dim();
        for (index, coords) in coordinates.iter().enumerate() {
            if coords.dim() != expected {
                return Err(Error::CoordinateShape {
                    zone: ZoneId(index),
                    expected,
                    found: coords.dim(),
                });
            }
        }
    }

    for zone in zones.iter_mut() {
        let velocities = operator.apply(zone.id().index(), &coordinates)?;
        zone.geometry_mut().set_grid_velocities(velocities);
    }

    tracing::debug!(n_zones = coordinates.len(), "updated spectral grid velocities");
    Ok(())
}
