//! Geometry kernel built on the `geo` crate.
//!
//! Thin wrappers around the path-algebra primitives the temporal
//! operators need: point-at-fraction, fraction-of-point, sub-line
//! extraction, planar azimuth, and distance/shortest-line between the
//! geometries produced by the trajectory builder (points, multipoints,
//! lines, and collections thereof).

use geo::algorithm::line_intersection::{LineIntersection, line_intersection};
use geo::{
    BooleanOps, Closest, ClosestPoint, Distance, Euclidean, Geometry, GeometryCollection,
    InterpolatableLine, Intersects, Line, LineLocatePoint, LineString, MultiLineString,
    MultiPoint, MultiPolygon, Point, Polygon,
};

/// Point at a fractional position along a line, measured by arc length.
pub fn point_at_fraction(line: &LineString<f64>, fraction: f64) -> Point<f64> {
    line.point_at_ratio_from_start(&Euclidean, fraction)
        .unwrap_or_else(|| Point::from(line.0[0]))
}

/// Fraction of the line's arc length at which `point` projects onto it.
pub fn locate_fraction(line: &LineString<f64>, point: &Point<f64>) -> f64 {
    line.line_locate_point(point).unwrap_or(0.0)
}

/// Cut a line between two arc-length fractions, `0 <= start < end <= 1`.
///
/// Both cut points are interpolated; interior vertices strictly between
/// them are preserved.
pub fn line_substring(line: &LineString<f64>, start: f64, end: f64) -> LineString<f64> {
    let total: f64 = line
        .lines()
        .map(|seg| Euclidean.distance(seg.start_point(), seg.end_point()))
        .sum();
    if total == 0.0 {
        return line.clone();
    }
    let d0 = start * total;
    let d1 = end * total;

    let mut coords = Vec::new();
    let mut walked = 0.0;
    for seg in line.lines() {
        let len = Euclidean.distance(seg.start_point(), seg.end_point());
        let seg_start = walked;
        let seg_end = walked + len;
        if len > 0.0 {
            // Entry point of the cut.
            if coords.is_empty() && d0 <= seg_end {
                let t = ((d0 - seg_start) / len).clamp(0.0, 1.0);
                coords.push(interpolate_on(&seg, t));
            }
            if !coords.is_empty() {
                if d1 <= seg_end {
                    let t = ((d1 - seg_start) / len).clamp(0.0, 1.0);
                    let last = interpolate_on(&seg, t);
                    push_distinct(&mut coords, last);
                    break;
                }
                push_distinct(&mut coords, seg.end);
            }
        }
        walked = seg_end;
    }
    if coords.len() < 2 {
        // Degenerate cut; repeat the single coordinate so the result
        // is still a valid line.
        let c = coords
            .first()
            .copied()
            .unwrap_or_else(|| point_at_fraction(line, start).into());
        coords = vec![c, c];
    }
    LineString::new(coords)
}

fn interpolate_on(seg: &Line<f64>, t: f64) -> geo::Coord<f64> {
    geo::coord! {
        x: seg.start.x + (seg.end.x - seg.start.x) * t,
        y: seg.start.y + (seg.end.y - seg.start.y) * t,
    }
}

fn push_distinct(coords: &mut Vec<geo::Coord<f64>>, c: geo::Coord<f64>) {
    if coords.last() != Some(&c) {
        coords.push(c);
    }
}

/// Reverse the direction of a line.
pub fn reverse(line: &LineString<f64>) -> LineString<f64> {
    let mut coords = line.0.clone();
    coords.reverse();
    LineString::new(coords)
}

/// Planar azimuth from `p1` to `p2`, clockwise from north, in
/// `[0, 2*PI)`. `None` when the points coincide.
pub fn azimuth(p1: &Point<f64>, p2: &Point<f64>) -> Option<f64> {
    if p1 == p2 {
        return None;
    }
    let a = (p2.x() - p1.x()).atan2(p2.y() - p1.y());
    Some(if a < 0.0 {
        a + 2.0 * std::f64::consts::PI
    } else {
        a
    })
}

/// Collapse a set of points into a geometry: a single point when only
/// one remains, a multipoint otherwise.
pub fn points_to_geometry(points: Vec<Point<f64>>) -> Geometry<f64> {
    if points.len() == 1 {
        Geometry::Point(points[0])
    } else {
        Geometry::MultiPoint(MultiPoint::new(points))
    }
}

/// Wrap per-sequence trajectories into one geometry.
pub fn union_geometries(mut parts: Vec<Geometry<f64>>) -> Geometry<f64> {
    if parts.len() == 1 {
        parts.remove(0)
    } else {
        Geometry::GeometryCollection(GeometryCollection::from(parts))
    }
}

/// Whether a point lies inside (or on the boundary of) a geometry.
pub fn point_in_geometry(point: &Point<f64>, geometry: &Geometry<f64>) -> bool {
    geometry.intersects(point)
}

fn collect_polygons(geometry: &Geometry<f64>, out: &mut Vec<Polygon<f64>>) {
    match geometry {
        Geometry::Polygon(p) => out.push(p.clone()),
        Geometry::MultiPolygon(mp) => out.extend(mp.iter().cloned()),
        Geometry::Rect(r) => out.push(r.to_polygon()),
        Geometry::Triangle(t) => out.push(t.to_polygon()),
        Geometry::GeometryCollection(gc) => {
            for g in gc {
                collect_polygons(g, out);
            }
        }
        _ => {}
    }
}

/// Areal footprint of a geometry, `None` when it has no areal part.
pub fn areal_part(geometry: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    let mut polygons = Vec::new();
    collect_polygons(geometry, &mut polygons);
    if polygons.is_empty() {
        None
    } else {
        Some(MultiPolygon::new(polygons))
    }
}

/// Pieces of `line` lying inside the area. Degenerate pieces from
/// tangent contacts are dropped.
pub fn clip_line(area: &MultiPolygon<f64>, line: &LineString<f64>) -> Vec<LineString<f64>> {
    let clipped = area.clip(&MultiLineString::new(vec![line.clone()]), false);
    clipped
        .0
        .into_iter()
        .filter(|piece| piece.0.len() >= 2 && piece.0.windows(2).any(|w| w[0] != w[1]))
        .collect()
}

/// Points where `line` meets the zero- and one-dimensional parts of a
/// geometry. A collinear overlap contributes its two endpoints.
pub fn line_crossings(line: &LineString<f64>, geometry: &Geometry<f64>) -> Vec<Point<f64>> {
    let mut prims = Vec::new();
    primitives(geometry, &mut prims);
    let mut out = Vec::new();
    for prim in &prims {
        match prim {
            Prim::Point(p) => {
                if line.intersects(p) {
                    out.push(*p);
                }
            }
            Prim::Line(other) => {
                for sa in line.lines() {
                    for sb in other.lines() {
                        match line_intersection(sa, sb) {
                            Some(LineIntersection::SinglePoint { intersection, .. }) => {
                                out.push(Point::from(intersection));
                            }
                            Some(LineIntersection::Collinear { intersection }) => {
                                out.push(intersection.start_point());
                                out.push(intersection.end_point());
                            }
                            None => {}
                        }
                    }
                }
            }
        }
    }
    out
}

// Trajectory geometries decompose into points and lines; distance and
// shortest-line reduce to the closest pair over those primitives.
enum Prim<'a> {
    Point(Point<f64>),
    Line(&'a LineString<f64>),
}

fn primitives<'a>(geometry: &'a Geometry<f64>, out: &mut Vec<Prim<'a>>) {
    match geometry {
        Geometry::Point(p) => out.push(Prim::Point(*p)),
        Geometry::MultiPoint(mp) => out.extend(mp.iter().map(|p| Prim::Point(*p))),
        Geometry::Line(l) => {
            // Not produced by the trajectory builder, but cheap to accept.
            out.push(Prim::Point(l.start_point()));
            out.push(Prim::Point(l.end_point()));
        }
        Geometry::LineString(ls) => out.push(Prim::Line(ls)),
        Geometry::MultiLineString(mls) => out.extend(mls.iter().map(Prim::Line)),
        Geometry::GeometryCollection(gc) => {
            for g in gc {
                primitives(g, out);
            }
        }
        other => {
            log::warn!("Unsupported geometry in distance computation: {:?}", other);
        }
    }
}

fn closest_on_line(line: &LineString<f64>, point: &Point<f64>) -> Point<f64> {
    match line.closest_point(point) {
        Closest::Intersection(p) | Closest::SinglePoint(p) => p,
        Closest::Indeterminate => Point::from(line.0[0]),
    }
}

fn crossing_point(a: &LineString<f64>, b: &LineString<f64>) -> Option<Point<f64>> {
    for sa in a.lines() {
        for sb in b.lines() {
            match line_intersection(sa, sb) {
                Some(LineIntersection::SinglePoint { intersection, .. }) => {
                    return Some(Point::from(intersection));
                }
                Some(LineIntersection::Collinear { intersection }) => {
                    return Some(intersection.start_point());
                }
                None => {}
            }
        }
    }
    None
}

fn closest_prim_pair(a: &Prim<'_>, b: &Prim<'_>) -> (Point<f64>, Point<f64>) {
    match (a, b) {
        (Prim::Point(p), Prim::Point(q)) => (*p, *q),
        (Prim::Point(p), Prim::Line(l)) => (*p, closest_on_line(l, p)),
        (Prim::Line(l), Prim::Point(q)) => (closest_on_line(l, q), *q),
        (Prim::Line(la), Prim::Line(lb)) => {
            if la.intersects(*lb)
                && let Some(c) = crossing_point(la, lb)
            {
                return (c, c);
            }
            let mut best: Option<(f64, Point<f64>, Point<f64>)> = None;
            let candidates = la
                .points()
                .map(|v| (v, closest_on_line(lb, &v)))
                .chain(lb.points().map(|w| (closest_on_line(la, &w), w)));
            for (pa, pb) in candidates {
                let d = Euclidean.distance(pa, pb);
                if best.as_ref().is_none_or(|(bd, _, _)| d < *bd) {
                    best = Some((d, pa, pb));
                }
            }
            let (_, pa, pb) = best.unwrap_or((0.0, Point::from(la.0[0]), Point::from(lb.0[0])));
            (pa, pb)
        }
    }
}

fn closest_pair(a: &Geometry<f64>, b: &Geometry<f64>) -> Option<(Point<f64>, Point<f64>)> {
    let mut prims_a = Vec::new();
    let mut prims_b = Vec::new();
    primitives(a, &mut prims_a);
    primitives(b, &mut prims_b);
    let mut best: Option<(f64, Point<f64>, Point<f64>)> = None;
    for pa in &prims_a {
        for pb in &prims_b {
            let (qa, qb) = closest_prim_pair(pa, pb);
            let d = Euclidean.distance(qa, qb);
            if best.as_ref().is_none_or(|(bd, _, _)| d < *bd) {
                best = Some((d, qa, qb));
            }
        }
    }
    best.map(|(_, qa, qb)| (qa, qb))
}

/// Minimum Euclidean distance between two trajectory geometries.
pub fn geometry_distance(a: &Geometry<f64>, b: &Geometry<f64>) -> f64 {
    match closest_pair(a, b) {
        Some((qa, qb)) => Euclidean.distance(qa, qb),
        None => f64::INFINITY,
    }
}

/// Shortest connecting line between two trajectory geometries.
pub fn shortest_line(a: &Geometry<f64>, b: &Geometry<f64>) -> Option<Line<f64>> {
    closest_pair(a, b).map(|(qa, qb)| Line::new(qa, qb))
}
