//! # Frequent Places
//!
//! Frequent-place detection and incremental deduplication for location history.
//!
//! This library provides:
//! - Greedy distance-based clustering of track points into places
//! - Home/work exclusion with consolidated geofences
//! - Composite-key deduplication when merging new batches into history
//! - Optional reverse-geocoding annotation through a caller-owned cache
//!
//! ## Features
//!
//! - **`parallel`** - Hash large merge batches in parallel with rayon
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use frequent_places::{ClusterOptions, GpsPoint, TrackPoint, cluster_places, merge_new_points};
//!
//! let batch = vec![
//!     TrackPoint::new("2025-01-01", "08:00", "Home", Some(GpsPoint::new(21.1000, -101.6000))),
//!     TrackPoint::new("2025-01-01", "08:05", "Home", Some(GpsPoint::new(21.1001, -101.6001))),
//!     TrackPoint::new("2025-01-01", "09:00", "Office", Some(GpsPoint::new(19.0, -99.0))),
//! ];
//!
//! // Merge the batch into (empty) history
//! let merged = merge_new_points(&[], &batch, "takeout-2025-01");
//! assert_eq!(merged.report.admitted_count, 3);
//!
//! // Rank places, keeping home/work in
//! let history: Vec<TrackPoint> = merged.admitted.into_iter().map(|r| r.point).collect();
//! let options = ClusterOptions { exclude_home_geofence: false, ..ClusterOptions::default() };
//! let places = cluster_places(&history, &options);
//! assert_eq!(places[0].visit_count, 2);
//! assert_eq!(places[0].representative_label.as_deref(), Some("Home"));
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, TrackError};

// Geographic utilities (distance, centroid, search envelopes)
pub mod geo_utils;

// Place clustering and ranking
pub mod clustering;
pub use clustering::{
    cluster_places, cluster_points, normalize_label, ClusterOptions, PlaceCluster, TimeRange,
};

// Home/work geofence exclusion
pub mod geofence;
pub use geofence::{consolidate_centers, exclude_home_places, GeofenceCenter};

// Incremental deduplication
pub mod dedup;
#[cfg(feature = "parallel")]
pub use dedup::merge_new_points_parallel;
pub use dedup::{merge_new_points, record_id, DedupKey, MergeOutcome, MergeReport};

// Reverse geocoding hooks
pub mod geocode;
pub use geocode::{annotate_places, GeocodeCache, ReverseGeocoder};

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("FrequentPlacesRust"),
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use frequent_places::GpsPoint;
/// let point = GpsPoint::new(21.1219, -101.6826); // León
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

impl From<GpsPoint> for geo::Point<f64> {
    fn from(p: GpsPoint) -> Self {
        geo::Point::new(p.longitude, p.latitude)
    }
}

impl From<geo::Point<f64>> for GpsPoint {
    fn from(p: geo::Point<f64>) -> Self {
        GpsPoint::new(p.y(), p.x())
    }
}

/// One observed location event from a parsed history file.
///
/// Latitude and longitude live together in `location`, so a point can never
/// carry only one of them. Points without a location are grouped by label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TrackPointWire", into = "TrackPointWire")]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct TrackPoint {
    /// Calendar date, may be empty
    pub date: String,
    /// Clock time or range ("HH:MM to HH:MM"), may be empty
    pub time: String,
    /// Free-text place name, may be empty
    pub label: String,
    pub location: Option<GpsPoint>,
    /// Origin batch, only used for record ids
    pub source_key: String,
}

impl TrackPoint {
    /// Create a track point from trusted parts.
    pub fn new(
        date: impl Into<String>,
        time: impl Into<String>,
        label: impl Into<String>,
        location: Option<GpsPoint>,
    ) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
            label: label.into(),
            location,
            source_key: String::new(),
        }
    }

    /// Create a track point from untrusted parts.
    ///
    /// Fails if exactly one coordinate is present, or if the coordinates are
    /// not finite WGS84 values.
    ///
    /// ```
    /// use frequent_places::{TrackError, TrackPoint};
    ///
    /// let ok = TrackPoint::from_parts("2025-01-01", "08:00", "", Some(21.1), Some(-101.6), "f1");
    /// assert!(ok.unwrap().is_geolocated());
    ///
    /// let partial = TrackPoint::from_parts("2025-01-01", "08:00", "", Some(21.1), None, "f1");
    /// assert!(matches!(partial, Err(TrackError::PartialCoordinates { .. })));
    /// ```
    pub fn from_parts(
        date: impl Into<String>,
        time: impl Into<String>,
        label: impl Into<String>,
        latitude: Option<f64>,
        longitude: Option<f64>,
        source_key: impl Into<String>,
    ) -> Result<Self> {
        let location = match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => {
                let point = GpsPoint::new(latitude, longitude);
                if !point.is_valid() {
                    return Err(TrackError::InvalidCoordinates { latitude, longitude });
                }
                Some(point)
            }
            (None, None) => None,
            (latitude, longitude) => {
                return Err(TrackError::PartialCoordinates { latitude, longitude });
            }
        };

        Ok(Self::new(date, time, label, location).with_source_key(source_key))
    }

    /// Set the origin batch key.
    pub fn with_source_key(mut self, source_key: impl Into<String>) -> Self {
        self.source_key = source_key.into();
        self
    }

    /// True when the point carries coordinates.
    pub fn is_geolocated(&self) -> bool {
        self.location.is_some()
    }

    /// Start of the time field: the part before " to ", trimmed.
    ///
    /// `None` when the time field is empty.
    pub fn start_time(&self) -> Option<&str> {
        let start = self.time.split(" to ").next().unwrap_or_default().trim();
        if start.is_empty() {
            None
        } else {
            Some(start)
        }
    }
}

/// Flat JSON shape used by collaborators.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TrackPointWire {
    date: String,
    time: String,
    label: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    source_key: String,
}

impl TryFrom<TrackPointWire> for TrackPoint {
    type Error = TrackError;

    fn try_from(wire: TrackPointWire) -> Result<Self> {
        TrackPoint::from_parts(
            wire.date,
            wire.time,
            wire.label,
            wire.latitude,
            wire.longitude,
            wire.source_key,
        )
    }
}

impl From<TrackPoint> for TrackPointWire {
    fn from(point: TrackPoint) -> Self {
        Self {
            date: point.date,
            time: point.time,
            label: point.label,
            latitude: point.location.map(|p| p.latitude),
            longitude: point.location.map(|p| p.longitude),
            source_key: point.source_key,
        }
    }
}

/// A track point already stored in history, with its record id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct TrackRecord {
    pub id: String,
    #[serde(flatten)]
    pub point: TrackPoint,
}

// ============================================================================
// FFI Exports (only when feature enabled)
// ============================================================================

#[cfg(feature = "ffi")]
mod ffi {
    use super::*;
    use log::{info, warn};

    /// Default clustering options.
    #[uniffi::export]
    pub fn default_cluster_options() -> ClusterOptions {
        init_logging();
        info!("[FrequentPlacesRust] default_cluster_options called");
        ClusterOptions::default()
    }

    /// Build a track point from raw parser output, or `None` if the
    /// coordinates violate the data model.
    #[uniffi::export]
    pub fn ffi_create_track_point(
        date: String,
        time: String,
        label: String,
        latitude: Option<f64>,
        longitude: Option<f64>,
        source_key: String,
    ) -> Option<TrackPoint> {
        init_logging();
        match TrackPoint::from_parts(date, time, label, latitude, longitude, source_key) {
            Ok(point) => Some(point),
            Err(e) => {
                warn!("[FrequentPlacesRust] Rejected track point: {}", e);
                None
            }
        }
    }

    /// Cluster, rank and filter places.
    #[uniffi::export]
    pub fn ffi_cluster_places(points: Vec<TrackPoint>, options: ClusterOptions) -> Vec<PlaceCluster> {
        init_logging();
        info!("[FrequentPlacesRust] cluster_places called with {} points", points.len());

        let start = std::time::Instant::now();
        let places = cluster_places(&points, &options);
        info!(
            "[FrequentPlacesRust] Returned {} places in {:?}",
            places.len(),
            start.elapsed()
        );
        places
    }

    /// Merge a new batch into existing history.
    #[uniffi::export]
    pub fn ffi_merge_new_points(
        existing: Vec<TrackRecord>,
        incoming: Vec<TrackPoint>,
        source_key: String,
    ) -> MergeOutcome {
        init_logging();
        info!(
            "[FrequentPlacesRust] merge_new_points: {} existing, {} incoming from '{}'",
            existing.len(),
            incoming.len(),
            source_key
        );

        let start = std::time::Instant::now();
        let outcome = merge_new_points_parallel(&existing, &incoming, &source_key);
        info!(
            "[FrequentPlacesRust] Admitted {}, skipped {} in {:?}",
            outcome.report.admitted_count,
            outcome.report.skipped_count,
            start.elapsed()
        );
        outcome
    }
}

// ============================================================================
// Tests
// ============================================================================
