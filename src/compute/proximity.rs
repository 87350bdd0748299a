//! Proximity operators: temporal distance, nearest approach, and
//! shortest connecting line.
//!
//! The two-object operators synchronize their operands first, then
//! evaluate the separation at the matched instants plus any interior
//! minimum between them; operands that never coexist in time fall back
//! to purely spatial reasoning where the operator allows it, and report
//! absence where it does not.

use crate::catalog::RouteCatalog;
use crate::compute::trajectory::trajectory;
use crate::compute::validation::ensure_same_srid;
use crate::error::{NetMotionError, Result};
use crate::geom;
use crate::temporal::{
    Interpolation, TInstant, TInstantSet, TSequence, TSequenceSet, Temporal, synchronize,
};
use crate::types::NetworkPoint;
use geo::{Distance, Euclidean, Geometry, HasDimensions, Line, Point};
use std::time::SystemTime;

/// Distance between two moving objects over their shared time domain,
/// as a temporal float. `None` when the operands never coexist.
pub fn distance<C: RouteCatalog>(
    catalog: &C,
    a: &Temporal<NetworkPoint>,
    b: &Temporal<NetworkPoint>,
) -> Result<Option<Temporal<f64>>> {
    ensure_same_srid(catalog, a, b)?;
    let Some((sa, sb)) = synchronize(a, b)? else {
        return Ok(None);
    };
    Ok(Some(pointwise_distance(catalog, &sa, &sb)?))
}

/// Pairwise distance of two synchronized temporal points. The operands
/// carry identical timestamps; linear sequences additionally get an
/// instant wherever the separation bottoms out between breakpoints.
fn pointwise_distance<C: RouteCatalog>(
    catalog: &C,
    a: &Temporal<NetworkPoint>,
    b: &Temporal<NetworkPoint>,
) -> Result<Temporal<f64>> {
    match (a, b) {
        (Temporal::Instant(ia), Temporal::Instant(ib)) => Ok(Temporal::Instant(TInstant::new(
            instant_distance(catalog, ia, ib)?,
            ia.timestamp,
        ))),
        (Temporal::InstantSet(sa), Temporal::InstantSet(sb)) => {
            let mut instants = Vec::with_capacity(sa.len());
            for (ia, ib) in sa.instants().iter().zip(sb.instants()) {
                instants.push(TInstant::new(
                    instant_distance(catalog, ia, ib)?,
                    ia.timestamp,
                ));
            }
            Ok(Temporal::InstantSet(TInstantSet::new(instants)?))
        }
        (Temporal::Sequence(sa), Temporal::Sequence(sb)) => Ok(Temporal::Sequence(
            sequence_distance(catalog, sa, sb)?,
        )),
        (Temporal::SequenceSet(sa), Temporal::SequenceSet(sb)) => {
            let mut sequences = Vec::with_capacity(sa.len());
            for (qa, qb) in sa.sequences().iter().zip(sb.sequences()) {
                sequences.push(sequence_distance(catalog, qa, qb)?);
            }
            Ok(Temporal::SequenceSet(TSequenceSet::new(sequences)?))
        }
        _ => Err(NetMotionError::Internal(
            "synchronized operands have mismatched variants".to_string(),
        )),
    }
}

fn sequence_distance<C: RouteCatalog>(
    catalog: &C,
    a: &TSequence<NetworkPoint>,
    b: &TSequence<NetworkPoint>,
) -> Result<TSequence<f64>> {
    let mut resolved = Vec::with_capacity(a.len());
    for (ia, ib) in a.instants().iter().zip(b.instants()) {
        let pa = catalog.resolve_point(&ia.value)?;
        let pb = catalog.resolve_point(&ib.value)?;
        resolved.push((pa, pb, ia.timestamp));
    }
    let interp = if a.is_linear() || b.is_linear() {
        Interpolation::Linear
    } else {
        Interpolation::Step
    };
    let mut instants = Vec::with_capacity(resolved.len());
    for (i, entry) in resolved.iter().enumerate() {
        let (pa, pb, t) = entry;
        instants.push(TInstant::new(Euclidean.distance(*pa, *pb), *t));
        // Between breakpoints the separation is quadratic in time; an
        // interior minimum needs its own instant or it is lost.
        if interp == Interpolation::Linear
            && let Some(next) = resolved.get(i + 1)
            && let Some(turn) = turning_instant(entry, next)
        {
            instants.push(turn);
        }
    }
    if instants.len() == 1 {
        let inst = instants.remove(0);
        return Ok(TSequence::instantaneous(inst, interp));
    }
    TSequence::new(instants, a.lower_inc(), a.upper_inc(), interp)
}

/// Local extremum of the distance between two objects moving in a
/// straight line from `from` to `to`, when it falls strictly inside the
/// span. Positions between synchronized breakpoints are taken along the
/// chord between the resolved endpoints.
fn turning_instant(
    from: &(Point<f64>, Point<f64>, SystemTime),
    to: &(Point<f64>, Point<f64>, SystemTime),
) -> Option<TInstant<f64>> {
    let (a1, b1, t1) = from;
    let (a2, b2, t2) = to;
    let ux = a1.x() - b1.x();
    let uy = a1.y() - b1.y();
    let vx = (a2.x() - a1.x()) - (b2.x() - b1.x());
    let vy = (a2.y() - a1.y()) - (b2.y() - b1.y());
    let denom = vx * vx + vy * vy;
    if denom == 0.0 {
        return None;
    }
    let s = -(ux * vx + uy * vy) / denom;
    if s <= 0.0 || s >= 1.0 {
        return None;
    }
    let span = t2.duration_since(*t1).ok()?;
    let t = *t1 + span.mul_f64(s);
    if t <= *t1 || t >= *t2 {
        return None;
    }
    let dx = ux + s * vx;
    let dy = uy + s * vy;
    Some(TInstant::new((dx * dx + dy * dy).sqrt(), t))
}

fn instant_distance<C: RouteCatalog>(
    catalog: &C,
    a: &TInstant<NetworkPoint>,
    b: &TInstant<NetworkPoint>,
) -> Result<f64> {
    let pa = catalog.resolve_point(&a.value)?;
    let pb = catalog.resolve_point(&b.value)?;
    Ok(Euclidean.distance(pa, pb))
}

/// Smallest distance ever separating two moving objects.
///
/// Temporally overlapping operands take the minimum of their temporal
/// distance; disjoint operands fall back to the distance between their
/// trajectories.
pub fn nearest_approach_distance<C: RouteCatalog>(
    catalog: &C,
    a: &Temporal<NetworkPoint>,
    b: &Temporal<NetworkPoint>,
) -> Result<f64> {
    match distance(catalog, a, b)? {
        Some(d) => Ok(d.min_value()),
        None => {
            let ta = trajectory(catalog, a)?;
            let tb = trajectory(catalog, b)?;
            Ok(geom::geometry_distance(&ta, &tb))
        }
    }
}

/// First instant at which the first operand is nearest to the second.
/// `None` when the operands never coexist in time.
pub fn nearest_approach_instant<C: RouteCatalog>(
    catalog: &C,
    a: &Temporal<NetworkPoint>,
    b: &Temporal<NetworkPoint>,
) -> Result<Option<TInstant<NetworkPoint>>> {
    let Some(d) = distance(catalog, a, b)? else {
        return Ok(None);
    };
    let t = d.min_instant().timestamp;
    let value = a.value_at_inclusive(t).ok_or_else(|| {
        NetMotionError::Internal("nearest approach timestamp outside the operand".to_string())
    })?;
    Ok(Some(TInstant::new(value, t)))
}

/// Segment connecting the two objects at their nearest approach.
/// `None` when the operands never coexist in time.
pub fn shortest_line<C: RouteCatalog>(
    catalog: &C,
    a: &Temporal<NetworkPoint>,
    b: &Temporal<NetworkPoint>,
) -> Result<Option<Line<f64>>> {
    let Some(d) = distance(catalog, a, b)? else {
        return Ok(None);
    };
    let t = d.min_instant().timestamp;
    let (va, vb) = match (a.value_at_inclusive(t), b.value_at_inclusive(t)) {
        (Some(va), Some(vb)) => (va, vb),
        _ => {
            return Err(NetMotionError::Internal(
                "nearest approach timestamp outside an operand".to_string(),
            ));
        }
    };
    let pa = catalog.resolve_point(&va)?;
    let pb = catalog.resolve_point(&vb)?;
    Ok(Some(Line::new(pa, pb)))
}

/// Smallest distance between a moving object and a fixed geometry.
/// `None` for an empty geometry.
pub fn nearest_approach_distance_geometry<C: RouteCatalog>(
    catalog: &C,
    temp: &Temporal<NetworkPoint>,
    geometry: &Geometry<f64>,
) -> Result<Option<f64>> {
    if geometry.is_empty() {
        return Ok(None);
    }
    let traj = trajectory(catalog, temp)?;
    Ok(Some(geom::geometry_distance(&traj, geometry)))
}

/// First stored instant at which a moving object is nearest to a fixed
/// geometry. `None` for an empty geometry.
pub fn nearest_approach_instant_geometry<C: RouteCatalog>(
    catalog: &C,
    temp: &Temporal<NetworkPoint>,
    geometry: &Geometry<f64>,
) -> Result<Option<TInstant<NetworkPoint>>> {
    if geometry.is_empty() {
        return Ok(None);
    }
    let mut best: Option<(&TInstant<NetworkPoint>, f64)> = None;
    for inst in temp.instants() {
        let p = catalog.resolve_point(&inst.value)?;
        let d = geom::geometry_distance(&Geometry::Point(p), geometry);
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((inst, d));
        }
    }
    Ok(best.map(|(inst, _)| inst.clone()))
}

/// Segment connecting a moving object's trajectory to a fixed geometry
/// at their closest points. `None` for an empty geometry.
pub fn shortest_line_geometry<C: RouteCatalog>(
    catalog: &C,
    temp: &Temporal<NetworkPoint>,
    geometry: &Geometry<f64>,
) -> Result<Option<Line<f64>>> {
    if geometry.is_empty() {
        return Ok(None);
    }
    let traj = trajectory(catalog, temp)?;
    Ok(geom::shortest_line(&traj, geometry))
}

/// [`nearest_approach_distance_geometry`] against a fixed network
/// position.
pub fn nearest_approach_distance_point<C: RouteCatalog>(
    catalog: &C,
    temp: &Temporal<NetworkPoint>,
    position: &NetworkPoint,
) -> Result<Option<f64>> {
    let p: Point<f64> = catalog.resolve_point(position)?;
    nearest_approach_distance_geometry(catalog, temp, &Geometry::Point(p))
}

/// [`shortest_line_geometry`] against a fixed network position.
pub fn shortest_line_point<C: RouteCatalog>(
    catalog: &C,
    temp: &Temporal<NetworkPoint>,
    position: &NetworkPoint,
) -> Result<Option<Line<f64>>> {
    let p: Point<f64> = catalog.resolve_point(position)?;
    shortest_line_geometry(catalog, temp, &Geometry::Point(p))
}
