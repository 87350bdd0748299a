//! Error types.

use thiserror::Error;

/// Errors raised by the temporal operators.
///
/// Only data-integrity violations are errors. Defined-absence outcomes
/// (disjoint time domains, a fully restricted-away value, an
/// all-constant azimuth input) are reported as `Ok(None)` by the
/// operators that can produce them.
#[derive(Error, Debug)]
pub enum NetMotionError {
    /// A route identifier not present in the catalog.
    #[error("Unknown route: {0}")]
    UnknownRoute(i64),

    /// Two operands whose routes live in different spatial reference
    /// systems.
    #[error("SRID mismatch: {left} vs {right}")]
    SridMismatch { left: i32, right: i32 },

    /// Two instants of one sequence on different routes.
    #[error("Mixed routes in one sequence: {left} vs {right}")]
    MixedRoutes { left: i64, right: i64 },

    /// A value rejected at construction or operator entry.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An internal consistency failure; not expected with correct
    /// callers.
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, NetMotionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            NetMotionError::UnknownRoute(42).to_string(),
            "Unknown route: 42"
        );
        assert_eq!(
            NetMotionError::SridMismatch {
                left: 4326,
                right: 3857
            }
            .to_string(),
            "SRID mismatch: 4326 vs 3857"
        );
        assert_eq!(
            NetMotionError::MixedRoutes { left: 1, right: 2 }.to_string(),
            "Mixed routes in one sequence: 1 vs 2"
        );
    }
}
