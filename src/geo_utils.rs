//! # Geographic Utilities
//!
//! Core geographic computation shared by the place clusterer and the home
//! geofence filter.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_km`] | Great-circle distance between two GPS points, in kilometres |
//! | [`distance_km`] | Same, taking raw latitude/longitude pairs |
//! | [`compute_center`] | Arithmetic centroid of a set of points |
//! | [`search_envelope`] | Conservative lat/lng box around a point for R-tree prefiltering |
//!
//! ## Example
//!
//! ```rust
//! use frequent_places::{GpsPoint, geo_utils};
//!
//! let a = GpsPoint::new(21.1000, -101.6000);
//! let b = GpsPoint::new(21.1001, -101.6001);
//!
//! let km = geo_utils::haversine_km(&a, &b);
//! assert!(km < 0.1);
//! ```
//!
//! ## Algorithm Notes
//!
//! ### Haversine Formula
//!
//! Distances are computed on a sphere of radius 6371 km. The intermediate
//! value is clamped to `[0, 1]` before `asin`, so coincident points return
//! exactly 0 and antipodal points return half the circumference instead of NaN.
//!
//! Reference: [Haversine formula (Wikipedia)](https://en.wikipedia.org/wiki/Haversine_formula)
//!
//! ### Coordinate System
//!
//! All functions expect WGS84 coordinates (latitude/longitude in degrees).

use geo::{Centroid, MultiPoint, Point};
use rstar::AABB;

use crate::GpsPoint;

/// Sphere radius used for every distance in this crate.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

// =============================================================================
// Distance Functions
// =============================================================================

/// Great-circle distance between two GPS points in kilometres.
///
/// # Example
///
/// ```rust
/// use frequent_places::{GpsPoint, geo_utils};
///
/// let london = GpsPoint::new(51.5074, -0.1278);
/// let paris = GpsPoint::new(48.8566, 2.3522);
///
/// let km = geo_utils::haversine_km(&london, &paris);
/// assert!((km - 343.5).abs() < 2.0);
/// ```
#[inline]
pub fn haversine_km(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    distance_km(p1.latitude, p1.longitude, p2.latitude, p2.longitude)
}

/// Great-circle distance between two raw coordinate pairs in kilometres.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.clamp(0.0, 1.0).sqrt().asin()
}

// =============================================================================
// Center/Centroid Functions
// =============================================================================

/// Compute the arithmetic centroid of a set of GPS points.
///
/// Returns `None` for empty input. Like any plain coordinate mean this is only
/// meaningful for points that are close together and do not straddle the
/// antimeridian, which is what a single place cluster looks like.
///
/// # Example
///
/// ```rust
/// use frequent_places::{GpsPoint, geo_utils};
///
/// let points = vec![
///     GpsPoint::new(51.50, -0.10),
///     GpsPoint::new(51.52, -0.12),
/// ];
///
/// let center = geo_utils::compute_center(&points).unwrap();
/// assert!((center.latitude - 51.51).abs() < 0.001);
/// assert!((center.longitude - (-0.11)).abs() < 0.001);
/// ```
pub fn compute_center(points: &[GpsPoint]) -> Option<GpsPoint> {
    let multi: MultiPoint<f64> = points.iter().map(|p| Point::from(*p)).collect();
    multi.centroid().map(GpsPoint::from)
}

// =============================================================================
// Spatial Index Helpers
// =============================================================================

/// Conservative search box (in `[lng, lat]` order) around `center`.
///
/// Every point within `radius_km` of `center` lies inside the returned box.
/// Returns `None` when no such box can be expressed as a single AABB: the
/// radius is not a finite non-negative number, the box would reach a pole,
/// or it would cross the antimeridian. Callers then fall back to a full scan.
pub fn search_envelope(center: &GpsPoint, radius_km: f64) -> Option<AABB<[f64; 2]>> {
    if !radius_km.is_finite() || radius_km < 0.0 {
        return None;
    }

    let angular = radius_km / EARTH_RADIUS_KM;
    if angular >= std::f64::consts::FRAC_PI_2 {
        return None;
    }

    // 1% padding absorbs floating point noise at the box edge
    let d_lat = angular.to_degrees() * 1.01 + 1e-9;
    let max_abs_lat = center.latitude.abs() + d_lat;
    if max_abs_lat >= 89.0 {
        return None;
    }

    // hav(d) >= cos(phi1) cos(phi2) hav(d_lambda) bounds the longitude span
    let s = (angular / 2.0).sin() / max_abs_lat.to_radians().cos();
    if s >= 1.0 {
        return None;
    }
    let d_lng = (2.0 * s.asin()).to_degrees() * 1.01 + 1e-9;

    let min_lng = center.longitude - d_lng;
    let max_lng = center.longitude + d_lng;
    if min_lng < -180.0 || max_lng > 180.0 {
        return None;
    }

    Some(AABB::from_corners(
        [min_lng, center.latitude - d_lat],
        [max_lng, center.latitude + d_lat],
    ))
}

// =============================================================================
// Unit Tests
// =============================================================================
