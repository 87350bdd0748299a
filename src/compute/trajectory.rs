//! Trajectory reconstruction: the geometric path traced by a temporal
//! network point.

use crate::catalog::RouteCatalog;
use crate::error::{NetMotionError, Result};
use crate::geom;
use crate::temporal::{TInstant, TSequence, Temporal};
use crate::types::{NetworkPoint, NetworkSegment};
use geo::Geometry;

/// Geometric path traced by a temporal network point.
///
/// An instant resolves to its point; an instant set or stepwise
/// sequence to its distinct resolved points; a linear sequence to the
/// sub-line of its route spanned by its fractions; a sequence set to
/// the union of its per-sequence trajectories.
pub fn trajectory<C: RouteCatalog>(
    catalog: &C,
    temp: &Temporal<NetworkPoint>,
) -> Result<Geometry<f64>> {
    match temp {
        Temporal::Instant(inst) => Ok(Geometry::Point(catalog.resolve_point(&inst.value)?)),
        Temporal::InstantSet(set) => distinct_points(catalog, set.instants()),
        Temporal::Sequence(seq) => sequence_trajectory(catalog, seq),
        Temporal::SequenceSet(set) => {
            // Singleton set delegates directly to the sequence case.
            if set.len() == 1 {
                return sequence_trajectory(catalog, &set.sequences()[0]);
            }
            let mut parts = Vec::with_capacity(set.len());
            for seq in set.sequences() {
                parts.push(sequence_trajectory(catalog, seq)?);
            }
            Ok(geom::union_geometries(parts))
        }
    }
}

fn sequence_trajectory<C: RouteCatalog>(
    catalog: &C,
    seq: &TSequence<NetworkPoint>,
) -> Result<Geometry<f64>> {
    // Instantaneous sequence degrades to the instant case.
    if seq.len() == 1 {
        return Ok(Geometry::Point(catalog.resolve_point(&seq.inst(0).value)?));
    }
    if seq.is_linear() {
        let fractions: Vec<f64> = seq
            .instants()
            .iter()
            .map(|inst| inst.value.fraction)
            .collect();
        let segment = NetworkSegment::span(seq.inst(0).value.route_id, &fractions)?;
        catalog.resolve_segment(&segment)
    } else {
        distinct_points(catalog, seq.instants())
    }
}

/// Resolved points with duplicates removed by pairwise equality.
/// Quadratic, which is acceptable for practical instant counts.
fn distinct_points<C: RouteCatalog>(
    catalog: &C,
    instants: &[TInstant<NetworkPoint>],
) -> Result<Geometry<f64>> {
    let mut distinct: Vec<NetworkPoint> = Vec::with_capacity(instants.len());
    for inst in instants {
        let mut found = false;
        for kept in &distinct {
            if inst.value.same(kept, catalog)? {
                found = true;
                break;
            }
        }
        if !found {
            distinct.push(inst.value);
        }
    }
    let mut points = Vec::with_capacity(distinct.len());
    for np in &distinct {
        points.push(catalog.resolve_point(np)?);
    }
    Ok(geom::points_to_geometry(points))
}

/// Fine-grained path between two positions on one route, oriented in
/// the direction of traversal. Cutting the route line is skipped when
/// the pair bounds the whole route.
pub fn pairwise_trajectory<C: RouteCatalog>(
    catalog: &C,
    from: &NetworkPoint,
    to: &NetworkPoint,
) -> Result<Geometry<f64>> {
    if from.route_id != to.route_id {
        return Err(NetMotionError::MixedRoutes {
            left: from.route_id,
            right: to.route_id,
        });
    }
    if from.fraction == to.fraction {
        return Ok(Geometry::Point(catalog.resolve_point(from)?));
    }
    let route = catalog.route(from.route_id)?;
    if from.fraction == 0.0 && to.fraction == 1.0 {
        return Ok(Geometry::LineString(route.geometry.clone()));
    }
    if from.fraction == 1.0 && to.fraction == 0.0 {
        return Ok(Geometry::LineString(geom::reverse(&route.geometry)));
    }
    let cut = if from.fraction < to.fraction {
        geom::line_substring(&route.geometry, from.fraction, to.fraction)
    } else {
        geom::reverse(&geom::line_substring(
            &route.geometry,
            to.fraction,
            from.fraction,
        ))
    };
    Ok(Geometry::LineString(cut))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::temporal::{Interpolation, TInstantSet, TSequenceSet};
    use geo::{Intersects, line_string};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

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

    #[test]
    fn test_instant_trajectory_is_a_point() {
        let temp = Temporal::Instant(TInstant::new(np(1, 0.25), ts(0)));
        match trajectory(&catalog(), &temp).unwrap() {
            Geometry::Point(p) => assert!((p.x() - 25.0).abs() < 1e-9),
            other => panic!("expected point, got {:?}", other),
        }
    }

    #[test]
    fn test_instant_set_removes_duplicates() {
        let temp = Temporal::InstantSet(
            TInstantSet::new(vec![
                TInstant::new(np(1, 0.2), ts(0)),
                TInstant::new(np(1, 0.8), ts(10)),
                TInstant::new(np(1, 0.2), ts(20)),
            ])
            .unwrap(),
        );
        match trajectory(&catalog(), &temp).unwrap() {
            Geometry::MultiPoint(mp) => assert_eq!(mp.0.len(), 2),
            other => panic!("expected multipoint, got {:?}", other),
        }
    }

    #[test]
    fn test_linear_sequence_resolves_to_sub_line() {
        let seq = TSequence::new(
            vec![
                TInstant::new(np(1, 0.2), ts(0)),
                TInstant::new(np(1, 0.6), ts(10)),
            ],
            true,
            true,
            Interpolation::Linear,
        )
        .unwrap();
        match trajectory(&catalog(), &Temporal::Sequence(seq)).unwrap() {
            Geometry::LineString(ls) => {
                assert!((ls.0[0].x - 20.0).abs() < 1e-9);
                assert!((ls.0.last().unwrap().x - 60.0).abs() < 1e-9);
            }
            other => panic!("expected line, got {:?}", other),
        }
    }

    #[test]
    fn test_whole_route_shortcut() {
        let catalog = catalog();
        let seq = TSequence::new(
            vec![
                TInstant::new(np(1, 0.0), ts(0)),
                TInstant::new(np(1, 1.0), ts(10)),
            ],
            true,
            true,
            Interpolation::Linear,
        )
        .unwrap();
        match trajectory(&catalog, &Temporal::Sequence(seq)).unwrap() {
            Geometry::LineString(ls) => {
                assert_eq!(ls, catalog.route(1).unwrap().geometry);
            }
            other => panic!("expected line, got {:?}", other),
        }
    }

    #[test]
    fn test_step_sequence_is_a_point_set() {
        let seq = TSequence::new(
            vec![
                TInstant::new(np(1, 0.2), ts(0)),
                TInstant::new(np(1, 0.8), ts(10)),
            ],
            true,
            true,
            Interpolation::Step,
        )
        .unwrap();
        match trajectory(&catalog(), &Temporal::Sequence(seq)).unwrap() {
            Geometry::MultiPoint(mp) => assert_eq!(mp.0.len(), 2),
            other => panic!("expected multipoint, got {:?}", other),
        }
    }

    #[test]
    fn test_trajectory_contains_every_resolved_point() {
        let catalog = catalog();
        let instants = vec![
            TInstant::new(np(1, 0.1), ts(0)),
            TInstant::new(np(1, 0.4), ts(10)),
            TInstant::new(np(1, 0.9), ts(20)),
        ];
        let seq = TSequence::new(instants.clone(), true, true, Interpolation::Linear).unwrap();
        let traj = trajectory(&catalog, &Temporal::Sequence(seq)).unwrap();
        for inst in &instants {
            let p = catalog.resolve_point(&inst.value).unwrap();
            assert!(traj.intersects(&p), "trajectory must contain {:?}", p);
        }
    }

    #[test]
    fn test_sequence_set_union() {
        let a = TSequence::new(
            vec![
                TInstant::new(np(1, 0.0), ts(0)),
                TInstant::new(np(1, 0.2), ts(10)),
            ],
            true,
            true,
            Interpolation::Linear,
        )
        .unwrap();
        let b = TSequence::new(
            vec![
                TInstant::new(np(1, 0.8), ts(20)),
                TInstant::new(np(1, 1.0), ts(30)),
            ],
            true,
            true,
            Interpolation::Linear,
        )
        .unwrap();
        let set = TSequenceSet::new(vec![a, b]).unwrap();
        match trajectory(&catalog(), &Temporal::SequenceSet(set)).unwrap() {
            Geometry::GeometryCollection(gc) => assert_eq!(gc.len(), 2),
            other => panic!("expected collection, got {:?}", other),
        }
    }

    #[test]
    fn test_pairwise_trajectory_orientation() {
        let catalog = catalog();
        match pairwise_trajectory(&catalog, &np(1, 0.6), &np(1, 0.2)).unwrap() {
            Geometry::LineString(ls) => {
                // Decreasing traversal: the cut is reversed.
                assert!((ls.0[0].x - 60.0).abs() < 1e-9);
                assert!((ls.0.last().unwrap().x - 20.0).abs() < 1e-9);
            }
            other => panic!("expected line, got {:?}", other),
        }

        match pairwise_trajectory(&catalog, &np(1, 0.5), &np(1, 0.5)).unwrap() {
            Geometry::Point(p) => assert!((p.x() - 50.0).abs() < 1e-9),
            other => panic!("expected point, got {:?}", other),
        }

        assert!(pairwise_trajectory(&catalog, &np(1, 0.0), &np(2, 1.0)).is_err());
    }
}
