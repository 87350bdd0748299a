//! Spatial restriction: the portion of a moving object inside or
//! outside a fixed geometry.
//!
//! Restriction works in geometric space, not at the resolution of the
//! stored instants. A linear sequence is cut at the exact crossings of
//! its path with the geometry, inserting interpolated boundary
//! instants, so a crossing that falls strictly between two stored
//! instants is still captured. Stepwise sequences hold their value
//! between instants, so their cuts fall on the stored timestamps.

use crate::catalog::RouteCatalog;
use crate::compute::trajectory::pairwise_trajectory;
use crate::error::{NetMotionError, Result};
use crate::geom;
use crate::temporal::{Period, TInstant, TInstantSet, TSequence, TSequenceSet, Temporal};
use crate::types::NetworkPoint;
use geo::{Geometry, HasDimensions, Point};
use std::time::Duration;

/// Which side of the geometry to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestrictMode {
    /// Keep the stretches spent inside the geometry.
    At,
    /// Keep the stretches spent outside the geometry.
    Minus,
}

/// Restrict a temporal network point to (or away from) a geometry.
///
/// An empty geometry contains nothing, so `At` yields absence and
/// `Minus` returns the operand unchanged. A fully filtered operand is
/// the defined "nothing remains" outcome, reported as `Ok(None)`.
pub fn restrict<C: RouteCatalog>(
    catalog: &C,
    temp: &Temporal<NetworkPoint>,
    geometry: &Geometry<f64>,
    mode: RestrictMode,
) -> Result<Option<Temporal<NetworkPoint>>> {
    if geometry.is_empty() {
        return Ok(match mode {
            RestrictMode::At => None,
            RestrictMode::Minus => Some(temp.clone()),
        });
    }
    match temp {
        Temporal::Instant(inst) => {
            let keep = keep_instant(catalog, inst, geometry, mode)?;
            Ok(keep.then(|| Temporal::Instant(inst.clone())))
        }
        Temporal::InstantSet(set) => {
            let mut kept = Vec::with_capacity(set.len());
            for inst in set.instants() {
                if keep_instant(catalog, inst, geometry, mode)? {
                    kept.push(inst.clone());
                }
            }
            if kept.is_empty() {
                return Ok(None);
            }
            Ok(Some(Temporal::InstantSet(TInstantSet::new(kept)?)))
        }
        Temporal::Sequence(seq) => {
            let runs = sequence_restrict(catalog, seq, geometry, mode)?;
            runs_to_temporal(runs)
        }
        Temporal::SequenceSet(set) => {
            let mut runs = Vec::new();
            for seq in set.sequences() {
                runs.extend(sequence_restrict(catalog, seq, geometry, mode)?);
            }
            runs_to_temporal(runs)
        }
    }
}

/// [`restrict`] with [`RestrictMode::At`].
pub fn at_geometry<C: RouteCatalog>(
    catalog: &C,
    temp: &Temporal<NetworkPoint>,
    geometry: &Geometry<f64>,
) -> Result<Option<Temporal<NetworkPoint>>> {
    restrict(catalog, temp, geometry, RestrictMode::At)
}

/// [`restrict`] with [`RestrictMode::Minus`].
pub fn minus_geometry<C: RouteCatalog>(
    catalog: &C,
    temp: &Temporal<NetworkPoint>,
    geometry: &Geometry<f64>,
) -> Result<Option<Temporal<NetworkPoint>>> {
    restrict(catalog, temp, geometry, RestrictMode::Minus)
}

fn keep_instant<C: RouteCatalog>(
    catalog: &C,
    inst: &TInstant<NetworkPoint>,
    geometry: &Geometry<f64>,
    mode: RestrictMode,
) -> Result<bool> {
    let resolved = catalog.resolve_point(&inst.value)?;
    let inside = geom::point_in_geometry(&resolved, geometry);
    Ok(match mode {
        RestrictMode::At => inside,
        RestrictMode::Minus => !inside,
    })
}

fn sequence_restrict<C: RouteCatalog>(
    catalog: &C,
    seq: &TSequence<NetworkPoint>,
    geometry: &Geometry<f64>,
    mode: RestrictMode,
) -> Result<Vec<TSequence<NetworkPoint>>> {
    if seq.len() == 1 {
        let keep = keep_instant(catalog, seq.inst(0), geometry, mode)?;
        return Ok(if keep { vec![seq.clone()] } else { Vec::new() });
    }
    if !seq.is_linear() {
        return step_runs(catalog, seq, geometry, mode);
    }
    let inside = inside_periods(catalog, seq, geometry)?;
    let domain = seq.period();
    let periods = match mode {
        RestrictMode::At => inherit_bounds(inside, &domain),
        RestrictMode::Minus => complement(&inside, &domain),
    };
    let mut runs = Vec::new();
    for period in &periods {
        if let Some(sliced) = slice_sequence(seq, period)? {
            runs.push(sliced);
        }
    }
    Ok(runs)
}

/// Closed time periods a linear sequence spends inside the geometry.
///
/// Stored instants that test inside anchor instantaneous periods; each
/// moving segment contributes the sub-spans where its path lies in the
/// areal part of the geometry, or the crossing instants with its lower
/// dimensional parts. Touching periods are merged.
fn inside_periods<C: RouteCatalog>(
    catalog: &C,
    seq: &TSequence<NetworkPoint>,
    geometry: &Geometry<f64>,
) -> Result<Vec<Period>> {
    let area = geom::areal_part(geometry);
    let mut periods = Vec::new();
    for inst in seq.instants() {
        let p = catalog.resolve_point(&inst.value)?;
        if geom::point_in_geometry(&p, geometry) {
            periods.push(Period::new(inst.timestamp, inst.timestamp, true, true));
        }
    }
    for pair in seq.instants().windows(2) {
        let (i0, i1) = (&pair[0], &pair[1]);
        let span = i1
            .timestamp
            .duration_since(i0.timestamp)
            .unwrap_or(Duration::ZERO);
        if (i1.value.fraction - i0.value.fraction).abs() < catalog.epsilon() {
            let p = catalog.resolve_point(&i0.value)?;
            if geom::point_in_geometry(&p, geometry) {
                periods.push(Period::new(i0.timestamp, i1.timestamp, true, true));
            }
            continue;
        }
        let path = match pairwise_trajectory(catalog, &i0.value, &i1.value)? {
            Geometry::LineString(ls) => ls,
            Geometry::Point(p) => {
                if geom::point_in_geometry(&p, geometry) {
                    periods.push(Period::new(i0.timestamp, i1.timestamp, true, true));
                }
                continue;
            }
            other => {
                return Err(NetMotionError::Internal(format!(
                    "unexpected pair path geometry: {:?}",
                    other
                )));
            }
        };
        if let Some(area) = &area {
            for piece in geom::clip_line(area, &path) {
                let f0 = geom::locate_fraction(&path, &Point::from(piece.0[0]));
                let f1 = geom::locate_fraction(&path, &Point::from(piece.0[piece.0.len() - 1]));
                let (lo, hi) = if f0 <= f1 { (f0, f1) } else { (f1, f0) };
                periods.push(Period::new(
                    i0.timestamp + span.mul_f64(lo),
                    i0.timestamp + span.mul_f64(hi),
                    true,
                    true,
                ));
            }
        } else {
            for crossing in geom::line_crossings(&path, geometry) {
                let f = geom::locate_fraction(&path, &crossing);
                let t = i0.timestamp + span.mul_f64(f);
                periods.push(Period::new(t, t, true, true));
            }
        }
    }
    Ok(merge_periods(periods))
}

/// Merge overlapping or touching closed periods into maximal ones.
fn merge_periods(mut periods: Vec<Period>) -> Vec<Period> {
    periods.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));
    let mut merged: Vec<Period> = Vec::new();
    for p in periods {
        match merged.last_mut() {
            Some(last) if p.start <= last.end => {
                if p.end > last.end {
                    last.end = p.end;
                }
            }
            _ => merged.push(p),
        }
    }
    merged
}

/// Carry the domain's bound inclusivity onto inside periods that touch
/// the domain boundary; interior cuts stay closed.
fn inherit_bounds(inside: Vec<Period>, domain: &Period) -> Vec<Period> {
    inside
        .into_iter()
        .filter_map(|p| {
            let lower_inc = if p.start == domain.start {
                domain.lower_inc
            } else {
                true
            };
            let upper_inc = if p.end == domain.end {
                domain.upper_inc
            } else {
                true
            };
            (p.start < p.end || (lower_inc && upper_inc))
                .then(|| Period::new(p.start, p.end, lower_inc, upper_inc))
        })
        .collect()
}

/// Complement of the inside periods within the sequence domain. Gap
/// bounds flip the inclusivity of the periods they border.
fn complement(inside: &[Period], domain: &Period) -> Vec<Period> {
    let mut out = Vec::new();
    let mut cursor = domain.start;
    let mut cursor_inc = domain.lower_inc;
    for p in inside {
        let gap = Period::new(cursor, p.start, cursor_inc, !p.lower_inc);
        if gap.start < gap.end || (gap.start == gap.end && gap.lower_inc && gap.upper_inc) {
            out.push(gap);
        }
        cursor = p.end;
        cursor_inc = !p.upper_inc;
    }
    let tail = Period::new(cursor, domain.end, cursor_inc, domain.upper_inc);
    if tail.start < tail.end || (tail.start == tail.end && tail.lower_inc && tail.upper_inc) {
        out.push(tail);
    }
    out
}

/// Cut the slice of a sequence covered by `period`, interpolating
/// boundary instants that fall between stored ones.
fn slice_sequence(
    seq: &TSequence<NetworkPoint>,
    period: &Period,
) -> Result<Option<TSequence<NetworkPoint>>> {
    if period.start == period.end {
        if !(period.lower_inc && period.upper_inc) {
            return Ok(None);
        }
        let value = value_at_checked(seq, period.start)?;
        return Ok(Some(TSequence::instantaneous(
            TInstant::new(value, period.start),
            seq.interp(),
        )));
    }
    let mut instants = Vec::new();
    instants.push(TInstant::new(
        value_at_checked(seq, period.start)?,
        period.start,
    ));
    for inst in seq.instants() {
        if inst.timestamp > period.start && inst.timestamp < period.end {
            instants.push(inst.clone());
        }
    }
    instants.push(TInstant::new(value_at_checked(seq, period.end)?, period.end));
    Ok(Some(TSequence::new(
        instants,
        period.lower_inc,
        period.upper_inc,
        seq.interp(),
    )?))
}

fn value_at_checked(
    seq: &TSequence<NetworkPoint>,
    t: std::time::SystemTime,
) -> Result<NetworkPoint> {
    seq.value_at_inclusive(t).ok_or_else(|| {
        NetMotionError::Internal("restriction cut outside the source sequence".to_string())
    })
}

/// Restrict a stepwise sequence: the value holds between stored
/// instants, so a kept run extends to the next stored timestamp with an
/// open upper bound.
fn step_runs<C: RouteCatalog>(
    catalog: &C,
    seq: &TSequence<NetworkPoint>,
    geometry: &Geometry<f64>,
    mode: RestrictMode,
) -> Result<Vec<TSequence<NetworkPoint>>> {
    let mut keep = Vec::with_capacity(seq.len());
    for inst in seq.instants() {
        keep.push(keep_instant(catalog, inst, geometry, mode)?);
    }
    let n = seq.len();
    let mut runs = Vec::new();
    let mut i = 0;
    while i < n {
        if !keep[i] {
            i += 1;
            continue;
        }
        let start = i;
        while i < n && keep[i] {
            i += 1;
        }
        let end = i - 1;
        let mut instants: Vec<TInstant<NetworkPoint>> = seq.instants()[start..=end].to_vec();
        let lower_inc = if start == 0 { seq.lower_inc() } else { true };
        let upper_inc = if end == n - 1 {
            seq.upper_inc()
        } else {
            let next_t = seq.inst(end + 1).timestamp;
            instants.push(TInstant::new(seq.inst(end).value.clone(), next_t));
            false
        };
        if instants.len() == 1 {
            // A lone final instant excluded by an open upper bound holds
            // no value at all.
            if seq.upper_inc() {
                runs.push(TSequence::instantaneous(instants.remove(0), seq.interp()));
            }
        } else {
            runs.push(TSequence::new(instants, lower_inc, upper_inc, seq.interp())?);
        }
    }
    Ok(runs)
}

fn runs_to_temporal(
    mut runs: Vec<TSequence<NetworkPoint>>,
) -> Result<Option<Temporal<NetworkPoint>>> {
    match runs.len() {
        0 => Ok(None),
        1 => Ok(Some(Temporal::Sequence(runs.remove(0)))),
        _ => Ok(Some(Temporal::SequenceSet(TSequenceSet::new(runs)?))),
    }
}
