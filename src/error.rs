//! Error types for boundary validation.
//!
//! The clustering and deduplication engines never fail. Errors only arise when
//! a collaborator hands over data that violates the data model, and those are
//! rejected while constructing [`TrackPoint`](crate::TrackPoint) or checking
//! [`ClusterOptions`](crate::ClusterOptions).

use thiserror::Error;

/// Errors raised when building track points or options from untrusted input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackError {
    /// Only one of latitude/longitude was supplied.
    #[error("Partial coordinates: latitude={latitude:?}, longitude={longitude:?} (both or neither required)")]
    PartialCoordinates {
        latitude: Option<f64>,
        longitude: Option<f64>,
    },

    /// Coordinates are non-finite or outside WGS84 range.
    #[error("Invalid coordinates: ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    /// A clustering option is out of range.
    #[error("Invalid option {name}: {reason}")]
    InvalidOption { name: &'static str, reason: String },
}

/// Result type alias for boundary operations.
pub type Result<T> = std::result::Result<T, TrackError>;

impl TrackError {
    /// Create an invalid option error.
    #[must_use]
    pub fn invalid_option(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            name,
            reason: reason.into(),
        }
    }
}
