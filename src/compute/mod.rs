//! Operators over temporal network points.

pub mod kinematics;
pub mod proximity;
pub mod restrict;
pub mod trajectory;
pub mod validation;

pub use kinematics::{azimuth, cumulative_length, length, speed};
pub use proximity::{
    distance, nearest_approach_distance, nearest_approach_distance_geometry,
    nearest_approach_distance_point, nearest_approach_instant,
    nearest_approach_instant_geometry, shortest_line, shortest_line_geometry,
    shortest_line_point,
};
pub use restrict::{RestrictMode, at_geometry, minus_geometry, restrict};
pub use trajectory::{pairwise_trajectory, trajectory};
pub use validation::{ensure_same_srid, srid_of};
