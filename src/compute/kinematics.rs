//! Motion-derived quantities: traversed length, cumulative length,
//! speed, and heading.
//!
//! Movement is only defined under linear interpolation. Instants,
//! instant sets, and stepwise sequences do not move between their
//! stored positions, so length-based operators report zero for them
//! and rate-based operators report absence.

use crate::catalog::RouteCatalog;
use crate::compute::trajectory::pairwise_trajectory;
use crate::error::{NetMotionError, Result};
use crate::geom;
use crate::temporal::{
    Interpolation, TInstant, TInstantSet, TSequence, TSequenceSet, Temporal, seconds_between,
};
use crate::types::NetworkPoint;
use geo::Geometry;
use smallvec::SmallVec;
use std::time::Duration;

/// Total distance traveled, in route units.
pub fn length<C: RouteCatalog>(catalog: &C, temp: &Temporal<NetworkPoint>) -> Result<f64> {
    match temp {
        Temporal::Instant(_) | Temporal::InstantSet(_) => Ok(0.0),
        Temporal::Sequence(seq) => sequence_length(catalog, seq),
        Temporal::SequenceSet(set) => {
            let mut total = 0.0;
            for seq in set.sequences() {
                total += sequence_length(catalog, seq)?;
            }
            Ok(total)
        }
    }
}

fn sequence_length<C: RouteCatalog>(catalog: &C, seq: &TSequence<NetworkPoint>) -> Result<f64> {
    if !seq.is_linear() || seq.len() < 2 {
        return Ok(0.0);
    }
    let route_length = catalog.route_length(seq.inst(0).value.route_id)?;
    let mut total = 0.0;
    for pair in seq.instants().windows(2) {
        total += (pair[1].value.fraction - pair[0].value.fraction).abs() * route_length;
    }
    Ok(total)
}

/// Distance traveled up to each instant, as a temporal float.
///
/// The accumulator carries across the components of a sequence set, so
/// the last value of the result equals [`length`]. Non-moving variants
/// yield a constant zero over the same instants.
pub fn cumulative_length<C: RouteCatalog>(
    catalog: &C,
    temp: &Temporal<NetworkPoint>,
) -> Result<Temporal<f64>> {
    match temp {
        Temporal::Instant(inst) => Ok(Temporal::Instant(TInstant::new(0.0, inst.timestamp))),
        Temporal::InstantSet(set) => {
            let zeros = set
                .instants()
                .iter()
                .map(|inst| TInstant::new(0.0, inst.timestamp))
                .collect();
            Ok(Temporal::InstantSet(TInstantSet::new(zeros)?))
        }
        Temporal::Sequence(seq) => Ok(Temporal::Sequence(sequence_cumulative(
            catalog, seq, 0.0,
        )?)),
        Temporal::SequenceSet(set) => {
            let mut prior = 0.0;
            let mut out = Vec::with_capacity(set.len());
            for seq in set.sequences() {
                let cumulative = sequence_cumulative(catalog, seq, prior)?;
                prior = cumulative.inst(cumulative.len() - 1).value;
                out.push(cumulative);
            }
            Ok(Temporal::SequenceSet(TSequenceSet::new(out)?))
        }
    }
}

fn sequence_cumulative<C: RouteCatalog>(
    catalog: &C,
    seq: &TSequence<NetworkPoint>,
    prior: f64,
) -> Result<TSequence<f64>> {
    if seq.len() == 1 {
        return Ok(TSequence::instantaneous(
            TInstant::new(prior, seq.inst(0).timestamp),
            seq.interp(),
        ));
    }
    let mut instants = Vec::with_capacity(seq.len());
    if seq.is_linear() {
        let route_length = catalog.route_length(seq.inst(0).value.route_id)?;
        let mut running = prior;
        instants.push(TInstant::new(running, seq.inst(0).timestamp));
        for pair in seq.instants().windows(2) {
            running += (pair[1].value.fraction - pair[0].value.fraction).abs() * route_length;
            instants.push(TInstant::new(running, pair[1].timestamp));
        }
    } else {
        for inst in seq.instants() {
            instants.push(TInstant::new(prior, inst.timestamp));
        }
    }
    TSequence::new(instants, seq.lower_inc(), seq.upper_inc(), seq.interp())
}

/// Speed in route units per second, as a stepwise temporal float.
///
/// Each instant carries the rate of the segment it starts; the last
/// instant repeats the rate of the final segment. Defined only for
/// linearly interpolated sequences with at least two instants, absent
/// otherwise.
pub fn speed<C: RouteCatalog>(
    catalog: &C,
    temp: &Temporal<NetworkPoint>,
) -> Result<Option<Temporal<f64>>> {
    match temp {
        Temporal::Instant(_) | Temporal::InstantSet(_) => Ok(None),
        Temporal::Sequence(seq) => Ok(sequence_speed(catalog, seq)?.map(Temporal::Sequence)),
        Temporal::SequenceSet(set) => {
            let mut out = Vec::with_capacity(set.len());
            for seq in set.sequences() {
                // Instantaneous components have no rate and drop out.
                if let Some(rates) = sequence_speed(catalog, seq)? {
                    out.push(rates);
                }
            }
            match out.len() {
                0 => Ok(None),
                1 => Ok(Some(Temporal::Sequence(out.remove(0)))),
                _ => Ok(Some(Temporal::SequenceSet(TSequenceSet::new(out)?))),
            }
        }
    }
}

fn sequence_speed<C: RouteCatalog>(
    catalog: &C,
    seq: &TSequence<NetworkPoint>,
) -> Result<Option<TSequence<f64>>> {
    if !seq.is_linear() || seq.len() < 2 {
        return Ok(None);
    }
    let route_length = catalog.route_length(seq.inst(0).value.route_id)?;
    let mut instants = Vec::with_capacity(seq.len());
    let mut rate = 0.0;
    for pair in seq.instants().windows(2) {
        let elapsed = seconds_between(pair[0].timestamp, pair[1].timestamp);
        rate = (pair[1].value.fraction - pair[0].value.fraction).abs() * route_length / elapsed;
        instants.push(TInstant::new(rate, pair[0].timestamp));
    }
    instants.push(TInstant::new(rate, seq.inst(seq.len() - 1).timestamp));
    Ok(Some(TSequence::new(
        instants,
        seq.lower_inc(),
        seq.upper_inc(),
        Interpolation::Step,
    )?))
}

/// Heading of movement, clockwise from north in `[0, 2*pi)`, as a
/// stepwise temporal float.
///
/// The heading follows the route geometry: each vertex crossed between
/// two stored instants contributes a breakpoint at the time the vertex
/// is passed. Stretches where the object stands still have no heading,
/// so the result splits into one sequence per moving stretch; each
/// stretch ends with a closing instant repeating its last heading at
/// the time movement stops. Absent when the object never moves.
pub fn azimuth<C: RouteCatalog>(
    catalog: &C,
    temp: &Temporal<NetworkPoint>,
) -> Result<Option<Temporal<f64>>> {
    match temp {
        Temporal::Instant(_) | Temporal::InstantSet(_) => Ok(None),
        Temporal::Sequence(seq) => {
            let chunks = sequence_azimuth(catalog, seq)?;
            chunks_to_temporal(chunks)
        }
        Temporal::SequenceSet(set) => {
            let mut chunks = Vec::new();
            for seq in set.sequences() {
                chunks.extend(sequence_azimuth(catalog, seq)?);
            }
            chunks_to_temporal(chunks)
        }
    }
}

fn chunks_to_temporal(mut chunks: Vec<TSequence<f64>>) -> Result<Option<Temporal<f64>>> {
    match chunks.len() {
        0 => Ok(None),
        1 => Ok(Some(Temporal::Sequence(chunks.remove(0)))),
        _ => Ok(Some(Temporal::SequenceSet(TSequenceSet::new(chunks)?))),
    }
}

fn sequence_azimuth<C: RouteCatalog>(
    catalog: &C,
    seq: &TSequence<NetworkPoint>,
) -> Result<Vec<TSequence<f64>>> {
    if !seq.is_linear() || seq.len() < 2 {
        return Ok(Vec::new());
    }
    let epsilon = catalog.epsilon();
    let mut chunks = Vec::new();
    let mut buffer: SmallVec<[TInstant<f64>; 8]> = SmallVec::new();
    let mut chunk_starts_at_first_segment = true;

    for (i, pair) in seq.instants().windows(2).enumerate() {
        let (inst1, inst2) = (&pair[0], &pair[1]);
        if (inst1.value.fraction - inst2.value.fraction).abs() < epsilon {
            // Movement stops; close the open stretch at the stop time.
            if !buffer.is_empty() {
                let last = buffer[buffer.len() - 1].value;
                buffer.push(TInstant::new(last, inst1.timestamp));
                chunks.push(close_chunk(
                    std::mem::take(&mut buffer),
                    seq,
                    chunk_starts_at_first_segment,
                )?);
            }
            chunk_starts_at_first_segment = false;
            continue;
        }
        if buffer.is_empty() {
            chunk_starts_at_first_segment = i == 0;
        }
        let path = match pairwise_trajectory(catalog, &inst1.value, &inst2.value)? {
            Geometry::LineString(line) => line,
            other => {
                return Err(NetMotionError::Internal(format!(
                    "segment path is not a line: {:?}",
                    other
                )));
            }
        };
        let span = inst2
            .timestamp
            .duration_since(inst1.timestamp)
            .unwrap_or(Duration::ZERO);
        let mut time = inst1.timestamp;
        for edge in path.lines() {
            let (start, end) = (edge.start_point(), edge.end_point());
            // Zero-length edges can appear at cut points.
            let Some(heading) = geom::azimuth(&start, &end) else {
                continue;
            };
            buffer.push(TInstant::new(heading, time));
            time = inst1.timestamp + span.mul_f64(geom::locate_fraction(&path, &end));
        }
    }

    if !buffer.is_empty() {
        let last = buffer[buffer.len() - 1].value;
        buffer.push(TInstant::new(last, seq.inst(seq.len() - 1).timestamp));
        chunks.push(close_chunk(buffer, seq, chunk_starts_at_first_segment)?);
    }
    Ok(chunks)
}

/// A stretch keeps the source lower bound only when it starts at the
/// first segment; stretches born at an interior stop are closed on
/// both ends, the stop instant itself carrying the last heading.
fn close_chunk(
    buffer: SmallVec<[TInstant<f64>; 8]>,
    seq: &TSequence<NetworkPoint>,
    starts_at_first_segment: bool,
) -> Result<TSequence<f64>> {
    let lower_inc = if starts_at_first_segment {
        seq.lower_inc()
    } else {
        true
    };
    TSequence::new(buffer.into_vec(), lower_inc, true, Interpolation::Step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use geo::line_string;
    use std::f64::consts::{FRAC_PI_2, PI};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn ts(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn np(route_id: i64, fraction: f64) -> NetworkPoint {
        NetworkPoint::new(route_id, fraction).unwrap()
    }

    fn catalog() -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new();
        catalog
            .add_route(1, line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)])
            .unwrap();
        catalog
    }

    fn linear_seq(points: &[(f64, u64)]) -> TSequence<NetworkPoint> {
        let instants = points
            .iter()
            .map(|&(f, t)| TInstant::new(np(1, f), ts(t)))
            .collect();
        TSequence::new(instants, true, true, Interpolation::Linear).unwrap()
    }

    #[test]
    fn test_length_of_linear_sequence() {
        let catalog = catalog();
        let temp = Temporal::Sequence(linear_seq(&[(0.0, 0), (0.5, 10)]));
        assert_eq!(length(&catalog, &temp).unwrap(), 50.0);

        // Direction changes still add up.
        let back_and_forth = Temporal::Sequence(linear_seq(&[(0.0, 0), (0.5, 10), (0.2, 20)]));
        assert!((length(&catalog, &back_and_forth).unwrap() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_length_of_non_moving_variants_is_zero() {
        let catalog = catalog();
        let inst = Temporal::Instant(TInstant::new(np(1, 0.5), ts(0)));
        assert_eq!(length(&catalog, &inst).unwrap(), 0.0);

        let step = Temporal::Sequence(
            TSequence::new(
                vec![
                    TInstant::new(np(1, 0.0), ts(0)),
                    TInstant::new(np(1, 0.5), ts(10)),
                ],
                true,
                true,
                Interpolation::Step,
            )
            .unwrap(),
        );
        assert_eq!(length(&catalog, &step).unwrap(), 0.0);
    }

    #[test]
    fn test_cumulative_length_runs_along_instants() {
        let catalog = catalog();
        let temp = Temporal::Sequence(linear_seq(&[(0.0, 0), (0.5, 10)]));
        let cumulative = cumulative_length(&catalog, &temp).unwrap();
        assert_eq!(cumulative.value_at(ts(0)), Some(0.0));
        assert_eq!(cumulative.value_at(ts(10)), Some(50.0));
        assert!(cumulative.is_linear());
    }

    #[test]
    fn test_cumulative_length_carries_across_components() {
        let catalog = catalog();
        let set = TSequenceSet::new(vec![
            linear_seq(&[(0.0, 0), (0.3, 10)]),
            linear_seq(&[(0.3, 20), (0.8, 30)]),
        ])
        .unwrap();
        let temp = Temporal::SequenceSet(set);
        let cumulative = cumulative_length(&catalog, &temp).unwrap();
        // The second component starts from the distance already traveled.
        assert_eq!(cumulative.value_at(ts(20)), Some(30.0));
        assert_eq!(cumulative.value_at(ts(30)), Some(80.0));
        assert_eq!(
            cumulative.value_at(ts(30)),
            Some(length(&catalog, &temp).unwrap())
        );
    }

    #[test]
    fn test_speed_is_stepwise_with_repeated_last_rate() {
        let catalog = catalog();
        let temp = Temporal::Sequence(linear_seq(&[(0.0, 0), (0.5, 10)]));
        let speed = speed(&catalog, &temp).unwrap().unwrap();
        assert!(!speed.is_linear());
        assert_eq!(speed.value_at(ts(0)), Some(5.0));
        assert_eq!(speed.value_at(ts(7)), Some(5.0));
        assert_eq!(speed.value_at(ts(10)), Some(5.0));
    }

    #[test]
    fn test_speed_undefined_without_linear_movement() {
        let catalog = catalog();
        let inst = Temporal::Instant(TInstant::new(np(1, 0.5), ts(0)));
        assert!(speed(&catalog, &inst).unwrap().is_none());

        let step = Temporal::Sequence(
            TSequence::new(
                vec![
                    TInstant::new(np(1, 0.0), ts(0)),
                    TInstant::new(np(1, 0.5), ts(10)),
                ],
                true,
                true,
                Interpolation::Step,
            )
            .unwrap(),
        );
        assert!(speed(&catalog, &step).unwrap().is_none());
    }

    #[test]
    fn test_azimuth_follows_route_vertices() {
        let mut catalog = MemoryCatalog::new();
        // L-shaped route: east for 50 units, then north for 50.
        catalog
            .add_route(
                1,
                line_string![(x: 0.0, y: 0.0), (x: 50.0, y: 0.0), (x: 50.0, y: 50.0)],
            )
            .unwrap();
        let temp = Temporal::Sequence(linear_seq(&[(0.0, 0), (1.0, 100)]));
        let heading = azimuth(&catalog, &temp).unwrap().unwrap();

        assert!(!heading.is_linear());
        assert_eq!(heading.instant_count(), 3);
        let instants = heading.instants();
        assert_eq!(instants[0].timestamp, ts(0));
        assert!((instants[0].value - FRAC_PI_2).abs() < 1e-9);
        // The corner is passed halfway through.
        assert_eq!(instants[1].timestamp, ts(50));
        assert!(instants[1].value.abs() < 1e-9);
        // Closing instant repeats the final heading.
        assert_eq!(instants[2].timestamp, ts(100));
        assert!(instants[2].value.abs() < 1e-9);
    }

    #[test]
    fn test_azimuth_splits_at_standstill() {
        let catalog = catalog();
        let temp = Temporal::Sequence(linear_seq(&[
            (0.0, 0),
            (0.5, 10),
            (0.5, 20),
            (1.0, 30),
        ]));
        let heading = azimuth(&catalog, &temp).unwrap().unwrap();
        match heading {
            Temporal::SequenceSet(set) => {
                assert_eq!(set.len(), 2);
                let first = set.sequences()[0].period();
                assert_eq!(first.start, ts(0));
                assert_eq!(first.end, ts(10));
                let second = set.sequences()[1].period();
                assert_eq!(second.start, ts(20));
                assert_eq!(second.end, ts(30));
            }
            other => panic!("expected sequence set, got {:?}", other),
        }
    }

    #[test]
    fn test_azimuth_reversal_flips_heading() {
        let catalog = catalog();
        let temp = Temporal::Sequence(linear_seq(&[(0.8, 0), (0.2, 10)]));
        let heading = azimuth(&catalog, &temp).unwrap().unwrap();
        // Moving toward decreasing fractions on an eastbound route means
        // heading west.
        assert!((heading.nth_instant(0).unwrap().value - 3.0 * FRAC_PI_2).abs() < 1e-9);
        assert!(heading.nth_instant(0).unwrap().value < 2.0 * PI);
    }

    #[test]
    fn test_azimuth_absent_without_movement() {
        let catalog = catalog();
        let still = Temporal::Sequence(linear_seq(&[(0.5, 0), (0.5, 10)]));
        assert!(azimuth(&catalog, &still).unwrap().is_none());
        let inst = Temporal::Instant(TInstant::new(np(1, 0.5), ts(0)));
        assert!(azimuth(&catalog, &inst).unwrap().is_none());
    }
}
