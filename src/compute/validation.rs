//! Operand validation shared by the temporal operators.

use crate::catalog::RouteCatalog;
use crate::error::{NetMotionError, Result};
use crate::temporal::Temporal;
use crate::types::NetworkPoint;

/// Spatial reference system of a temporal network point, read through
/// the route of its first instant. Sequences cannot mix routes, and a
/// catalog is expected to keep one SRID per connected network, so the
/// first instant is representative.
pub fn srid_of<C: RouteCatalog>(catalog: &C, temp: &Temporal<NetworkPoint>) -> Result<i32> {
    let first = temp.nth_instant(0).ok_or_else(|| {
        NetMotionError::Internal("temporal value with no instants".to_string())
    })?;
    Ok(catalog.route(first.value.route_id)?.srid)
}

/// Reject operand pairs whose routes live in different spatial
/// reference systems.
pub fn ensure_same_srid<C: RouteCatalog>(
    catalog: &C,
    a: &Temporal<NetworkPoint>,
    b: &Temporal<NetworkPoint>,
) -> Result<()> {
    let left = srid_of(catalog, a)?;
    let right = srid_of(catalog, b)?;
    if left != right {
        return Err(NetMotionError::SridMismatch { left, right });
    }
    Ok(())
}
