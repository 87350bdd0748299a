//! Core value types for network-constrained positions.
//!
//! A [`NetworkPoint`] locates an object on a route of the network by a
//! fractional offset; a [`NetworkSegment`] describes a contiguous
//! sub-range of a route. Both are immutable value types validated at
//! construction.

use crate::catalog::RouteCatalog;
use crate::error::{NetMotionError, Result};
use serde::de::Error;
use serde::{Deserialize, Serialize};

/// Tolerance used when comparing fractions and coordinates.
pub const EPSILON: f64 = 1e-12;

/// A position on the network: a route identifier plus a fractional
/// offset along that route (0 = start, 1 = end).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkPoint {
    pub route_id: i64,
    pub fraction: f64,
}

impl NetworkPoint {
    /// Create a network point, validating that the fraction is a finite
    /// number in `[0, 1]`.
    pub fn new(route_id: i64, fraction: f64) -> Result<Self> {
        if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
            return Err(NetMotionError::InvalidInput(format!(
                "Fraction must be in [0, 1], got: {}",
                fraction
            )));
        }
        Ok(Self { route_id, fraction })
    }

    /// Geographical equality. Two network points on the same route are
    /// equal when their fractions differ by less than the catalog
    /// epsilon; points on different routes may still coincide at a
    /// route intersection, so they are resolved to absolute points and
    /// compared coordinate-wise.
    pub fn same(&self, other: &NetworkPoint, catalog: &impl RouteCatalog) -> Result<bool> {
        if self.route_id == other.route_id {
            return Ok((self.fraction - other.fraction).abs() < catalog.epsilon());
        }
        let p1 = catalog.resolve_point(self)?;
        let p2 = catalog.resolve_point(other)?;
        let eps = catalog.epsilon();
        Ok((p1.x() - p2.x()).abs() < eps && (p1.y() - p2.y()).abs() < eps)
    }
}

/// A contiguous sub-range of a route, `0 <= lower <= upper <= 1`.
///
/// Used to describe the spatial footprint of a whole sequence without
/// enumerating every instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkSegment {
    pub route_id: i64,
    pub lower: f64,
    pub upper: f64,
}

impl NetworkSegment {
    /// Create a segment, normalizing the argument order.
    pub fn new(route_id: i64, lower: f64, upper: f64) -> Result<Self> {
        for fraction in [lower, upper] {
            if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
                return Err(NetMotionError::InvalidInput(format!(
                    "Segment fraction must be in [0, 1], got: {}",
                    fraction
                )));
            }
        }
        let (lower, upper) = if lower <= upper {
            (lower, upper)
        } else {
            (upper, lower)
        };
        Ok(Self {
            route_id,
            lower,
            upper,
        })
    }

    /// The minimal segment spanning all given fractions.
    ///
    /// Returns an error on an empty slice.
    pub fn span(route_id: i64, fractions: &[f64]) -> Result<Self> {
        let mut iter = fractions.iter().copied();
        let first = iter.next().ok_or_else(|| {
            NetMotionError::InvalidInput("Cannot span an empty set of fractions".to_string())
        })?;
        let (mut lower, mut upper) = (first, first);
        for fraction in iter {
            lower = lower.min(fraction);
            upper = upper.max(fraction);
        }
        Self::new(route_id, lower, upper)
    }

    /// Whether the segment covers its whole route.
    pub fn is_whole_route(&self) -> bool {
        self.lower == 0.0 && self.upper == 1.0
    }

    /// Whether the segment degenerates to a single position.
    pub fn is_point(&self) -> bool {
        self.lower == self.upper
    }
}

/// Configuration for the route catalog and position comparisons.
///
/// Designed to be easily serializable and loadable from JSON while
/// keeping complexity minimal.
///
/// # Example
///
/// ```rust
/// use netmotion::Config;
///
/// let json = r#"{ "epsilon": 1e-9, "default_srid": 4326 }"#;
/// let config: Config = Config::from_json(json).unwrap();
/// assert_eq!(config.default_srid, 4326);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Tolerance for fraction and coordinate comparisons.
    #[serde(default = "Config::default_epsilon")]
    pub epsilon: f64,

    /// SRID assigned to routes inserted without an explicit one.
    #[serde(default)]
    pub default_srid: i32,
}

impl Config {
    const fn default_epsilon() -> f64 {
        EPSILON
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_default_srid(mut self, srid: i32) -> Self {
        self.default_srid = srid;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(NetMotionError::InvalidInput(format!(
                "Epsilon must be a positive finite number, got: {}",
                self.epsilon
            )));
        }
        Ok(())
    }

    /// Load configuration from a JSON string.
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde_json::Error::custom(e.to_string()));
        }
        Ok(config)
    }

    /// Save configuration as a JSON string.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            epsilon: Self::default_epsilon(),
            default_srid: 0,
        }
    }
}
