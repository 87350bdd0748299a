//! Temporal algebra for objects moving along a fixed network of routes.
//!
//! Positions are stored as linear references (route plus fraction) and
//! only resolved to absolute geometry when an operator needs it.
//!
//! ```rust
//! use netmotion::prelude::*;
//! use std::time::{Duration, UNIX_EPOCH};
//!
//! let mut catalog = MemoryCatalog::new();
//! catalog.add_route(1, line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)])?;
//!
//! let trip = Temporal::Sequence(TSequence::new(
//!     vec![
//!         TInstant::new(NetworkPoint::new(1, 0.0)?, UNIX_EPOCH),
//!         TInstant::new(NetworkPoint::new(1, 0.5)?, UNIX_EPOCH + Duration::from_secs(10)),
//!     ],
//!     true,
//!     true,
//!     Interpolation::Linear,
//! )?);
//!
//! assert_eq!(length(&catalog, &trip)?, 50.0);
//! # Ok::<(), netmotion::NetMotionError>(())
//! ```

pub mod catalog;
pub mod compute;
pub mod error;
pub mod geom;
pub mod temporal;
pub mod types;

pub use catalog::{MemoryCatalog, Route, RouteCatalog};
pub use error::{NetMotionError, Result};

pub use geo::{Geometry, Line, LineString, Point, line_string};

pub use temporal::{
    Interpolation, Period, TInstant, TInstantSet, TSequence, TSequenceSet, Temporal,
    TemporalValue, synchronize,
};

pub use types::{Config, EPSILON, NetworkPoint, NetworkSegment};

pub use compute::{
    RestrictMode, at_geometry, azimuth, cumulative_length, distance, ensure_same_srid, length,
    minus_geometry, nearest_approach_distance, nearest_approach_distance_geometry,
    nearest_approach_distance_point, nearest_approach_instant,
    nearest_approach_instant_geometry, pairwise_trajectory, restrict, shortest_line,
    shortest_line_geometry, shortest_line_point, speed, srid_of, trajectory,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{MemoryCatalog, NetMotionError, Result, Route, RouteCatalog};

    pub use crate::{Config, NetworkPoint, NetworkSegment};

    pub use crate::{
        Interpolation, Period, TInstant, TInstantSet, TSequence, TSequenceSet, Temporal,
        synchronize,
    };

    pub use crate::{
        RestrictMode, at_geometry, azimuth, cumulative_length, distance, length,
        minus_geometry, nearest_approach_distance, nearest_approach_instant, restrict,
        shortest_line, speed, trajectory,
    };

    pub use geo::{Geometry, Line, LineString, Point, line_string};
}
