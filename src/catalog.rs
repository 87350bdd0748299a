//! Route catalog: the linear-reference resolver.
//!
//! The temporal operators only ever see the network through the
//! [`RouteCatalog`] trait, which maps a route identifier to its
//! absolute geometry and length. [`MemoryCatalog`] is the in-process
//! implementation; hosts with an external catalog implement the trait
//! themselves.

use crate::error::{NetMotionError, Result};
use crate::geom;
use crate::types::{Config, EPSILON, NetworkPoint, NetworkSegment};
use geo::{Euclidean, Geometry, Length, LineString, Point};
use rustc_hash::FxHashMap;

/// A catalog entry: the absolute geometry of a route, its length, and
/// its spatial reference system.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub geometry: LineString<f64>,
    pub length: f64,
    pub srid: i32,
}

impl Route {
    /// Build a route from its geometry; the length is derived once.
    pub fn new(geometry: LineString<f64>, srid: i32) -> Result<Self> {
        if geometry.0.len() < 2 {
            return Err(NetMotionError::InvalidInput(
                "Route geometry must have at least two coordinates".to_string(),
            ));
        }
        let length = Euclidean.length(&geometry);
        Ok(Self {
            geometry,
            length,
            srid,
        })
    }
}

/// Read-only lookup service resolving route identifiers.
///
/// `route` is the single required method; everything else is linear
/// referencing derived from it.
pub trait RouteCatalog {
    /// Resolve a route identifier. An unknown identifier is a
    /// data-integrity violation, reported as [`NetMotionError::UnknownRoute`].
    fn route(&self, route_id: i64) -> Result<&Route>;

    /// Comparison tolerance for positions resolved through this catalog.
    fn epsilon(&self) -> f64 {
        EPSILON
    }

    fn route_length(&self, route_id: i64) -> Result<f64> {
        Ok(self.route(route_id)?.length)
    }

    /// Absolute point geometry of a network position.
    fn resolve_point(&self, position: &NetworkPoint) -> Result<Point<f64>> {
        let route = self.route(position.route_id)?;
        Ok(geom::point_at_fraction(&route.geometry, position.fraction))
    }

    /// Absolute geometry of a segment: a point when degenerate, the
    /// whole route line when the segment bounds it exactly (cutting is
    /// skipped in that case), a sub-line otherwise.
    fn resolve_segment(&self, segment: &NetworkSegment) -> Result<Geometry<f64>> {
        let route = self.route(segment.route_id)?;
        if segment.is_point() {
            return Ok(Geometry::Point(geom::point_at_fraction(
                &route.geometry,
                segment.lower,
            )));
        }
        if segment.is_whole_route() {
            return Ok(Geometry::LineString(route.geometry.clone()));
        }
        Ok(Geometry::LineString(geom::line_substring(
            &route.geometry,
            segment.lower,
            segment.upper,
        )))
    }

    /// Fraction along a route at which an absolute point projects.
    fn locate(&self, route_id: i64, point: &Point<f64>) -> Result<f64> {
        let route = self.route(route_id)?;
        Ok(geom::locate_fraction(&route.geometry, point))
    }
}

/// In-memory route catalog.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    routes: FxHashMap<i64, Route>,
    config: Config,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            routes: FxHashMap::default(),
            config,
        })
    }

    /// Insert a route with the configured default SRID.
    pub fn add_route(&mut self, route_id: i64, geometry: LineString<f64>) -> Result<()> {
        self.add_route_with_srid(route_id, geometry, self.config.default_srid)
    }

    pub fn add_route_with_srid(
        &mut self,
        route_id: i64,
        geometry: LineString<f64>,
        srid: i32,
    ) -> Result<()> {
        let route = Route::new(geometry, srid)?;
        self.routes.insert(route_id, route);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl RouteCatalog for MemoryCatalog {
    fn route(&self, route_id: i64) -> Result<&Route> {
        self.routes
            .get(&route_id)
            .ok_or(NetMotionError::UnknownRoute(route_id))
    }

    fn epsilon(&self) -> f64 {
        self.config.epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    fn catalog() -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new();
        catalog
            .add_route(1, line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)])
            .unwrap();
        catalog
    }

    #[test]
    fn test_route_length_is_derived() {
        assert_eq!(catalog().route_length(1).unwrap(), 100.0);
    }

    #[test]
    fn test_unknown_route_is_an_error() {
        let err = catalog().route(99).unwrap_err();
        assert!(matches!(err, NetMotionError::UnknownRoute(99)));
    }

    #[test]
    fn test_route_requires_two_coordinates() {
        let mut catalog = MemoryCatalog::new();
        let result = catalog.add_route(7, LineString::new(vec![geo::coord! { x: 0.0, y: 0.0 }]));
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_point() {
        let catalog = catalog();
        let p = catalog
            .resolve_point(&NetworkPoint::new(1, 0.5).unwrap())
            .unwrap();
        assert!((p.x() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_segment_variants() {
        let catalog = catalog();

        let point = catalog
            .resolve_segment(&NetworkSegment::new(1, 0.5, 0.5).unwrap())
            .unwrap();
        assert!(matches!(point, Geometry::Point(_)));

        let whole = catalog
            .resolve_segment(&NetworkSegment::new(1, 0.0, 1.0).unwrap())
            .unwrap();
        match whole {
            Geometry::LineString(ls) => assert_eq!(ls, catalog.route(1).unwrap().geometry),
            other => panic!("expected line, got {:?}", other),
        }

        let cut = catalog
            .resolve_segment(&NetworkSegment::new(1, 0.2, 0.6).unwrap())
            .unwrap();
        match cut {
            Geometry::LineString(ls) => {
                assert!((ls.0[0].x - 20.0).abs() < 1e-9);
                assert!((ls.0.last().unwrap().x - 60.0).abs() < 1e-9);
            }
            other => panic!("expected line, got {:?}", other),
        }
    }

    #[test]
    fn test_locate_inverts_resolve() {
        let catalog = catalog();
        let np = NetworkPoint::new(1, 0.35).unwrap();
        let p = catalog.resolve_point(&np).unwrap();
        assert!((catalog.locate(1, &p).unwrap() - 0.35).abs() < 1e-9);
    }

    #[test]
    fn test_catalog_config_epsilon() {
        let catalog = MemoryCatalog::with_config(Config::default().with_epsilon(1e-6)).unwrap();
        assert_eq!(catalog.epsilon(), 1e-6);
        assert!(MemoryCatalog::with_config(Config::default().with_epsilon(-1.0)).is_err());
    }
}
