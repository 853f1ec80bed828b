//! # Place Clustering
//!
//! Groups track points into candidate places and ranks them by visit count.
//!
//! Geo-located points are assigned greedily, in input order, to the first
//! existing cluster (in creation order) whose current centroid lies within
//! the distance threshold. The centroid moves as members are added, so the
//! result depends on input order: the same set of points fed in a different
//! order can produce different clusters. Label-only points are bucketed by
//! normalized label and never mix with geo clusters.
//!
//! ```rust
//! use frequent_places::{GpsPoint, TrackPoint, cluster_points};
//!
//! let points = vec![
//!     TrackPoint::new("2025-01-01", "08:00", "", Some(GpsPoint::new(21.1000, -101.6000))),
//!     TrackPoint::new("2025-01-01", "08:05", "", Some(GpsPoint::new(21.1001, -101.6001))),
//!     TrackPoint::new("2025-01-01", "09:00", "", Some(GpsPoint::new(19.0, -99.0))),
//! ];
//!
//! let clusters = cluster_points(&points, 0.1);
//! assert_eq!(clusters.len(), 2);
//! assert_eq!(clusters[0].visit_count, 2);
//! ```

use std::collections::{BTreeSet, HashMap};

use log::debug;
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackError};
use crate::geo_utils::{compute_center, haversine_km, search_envelope};
use crate::geofence::exclude_home_places;
use crate::{GpsPoint, TrackPoint};

/// Bucket name for label-only points whose label is empty.
pub const UNKNOWN_LABEL: &str = "unknown";

// ============================================================================
// Types
// ============================================================================

/// Earliest and latest start time seen among a cluster's members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct TimeRange {
    pub earliest: String,
    pub latest: String,
}

/// A group of track points believed to be one physical place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct PlaceCluster {
    /// Mean of the geo-located members, `None` for label-only clusters
    pub centroid: Option<GpsPoint>,
    /// Most frequent non-empty label (ties go to the first seen)
    pub representative_label: Option<String>,
    /// Normalized label for label-only clusters
    pub label_key: Option<String>,
    /// Members in input order
    pub members: Vec<TrackPoint>,
    pub visit_count: u32,
    /// Unique non-empty dates, ascending
    pub visit_dates: Vec<String>,
    pub time_range: Option<TimeRange>,
    /// Filled by [`annotate_places`](crate::annotate_places)
    pub address: Option<String>,
}

impl PlaceCluster {
    /// True when the cluster was formed from label-only points.
    pub fn is_label_only(&self) -> bool {
        self.centroid.is_none()
    }

    /// Label to show for this place: the representative label, then the
    /// geocoded address, then the normalized bucket key.
    pub fn display_name(&self) -> Option<&str> {
        self.representative_label
            .as_deref()
            .or(self.address.as_deref())
            .or(self.label_key.as_deref())
    }
}

/// Options for [`cluster_places`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct ClusterOptions {
    /// Maximum distance from a cluster centroid for a point to join it.
    /// Default: 0.1 km
    pub distance_threshold_km: f64,

    /// Number of places returned.
    /// Default: 3
    pub limit: u32,

    /// Drop the most visited places and their surroundings.
    /// Default: true
    pub exclude_home_geofence: bool,

    /// Exclusion radius around each home/work geofence center.
    /// Default: 0.2 km
    pub geofence_radius_km: f64,

    /// How many of the most visited places count as home/work.
    /// Default: 2
    pub exclude_top_n: u32,

    /// Geofence centers closer than this are consolidated into one.
    /// Default: 0.5 km
    pub merge_radius_km: f64,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            distance_threshold_km: 0.1,
            limit: 3,
            exclude_home_geofence: true,
            geofence_radius_km: 0.2,
            exclude_top_n: 2,
            merge_radius_km: 0.5,
        }
    }
}

impl ClusterOptions {
    /// Check that every radius is a finite, non-negative number.
    ///
    /// The clustering functions accept any options and never fail; this is
    /// for collaborators that take options from users.
    pub fn validate(&self) -> Result<()> {
        let radii = [
            ("distance_threshold_km", self.distance_threshold_km),
            ("geofence_radius_km", self.geofence_radius_km),
            ("merge_radius_km", self.merge_radius_km),
        ];
        for (name, value) in radii {
            if !value.is_finite() {
                return Err(TrackError::invalid_option(name, format!("{value} is not finite")));
            }
            if value < 0.0 {
                return Err(TrackError::invalid_option(name, format!("{value} is negative")));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Public Entry Points
// ============================================================================

/// Cluster, rank and privacy-filter track points.
///
/// Runs [`cluster_points`], then either the home geofence filter or a plain
/// truncation to `options.limit`.
pub fn cluster_places(points: &[TrackPoint], options: &ClusterOptions) -> Vec<PlaceCluster> {
    let clusters = cluster_points(points, options.distance_threshold_km);

    if options.exclude_home_geofence {
        exclude_home_places(clusters, options)
    } else {
        clusters.into_iter().take(options.limit as usize).collect()
    }
}

/// Group track points into places, sorted by descending visit count.
///
/// Every input point ends up in exactly one cluster. Ties in visit count keep
/// creation order, with geo clusters ahead of label clusters.
pub fn cluster_points(points: &[TrackPoint], distance_threshold_km: f64) -> Vec<PlaceCluster> {
    if points.is_empty() {
        return vec![];
    }

    let (geo_points, label_points): (Vec<&TrackPoint>, Vec<&TrackPoint>) =
        points.iter().partition(|p| p.is_geolocated());

    let mut builders = assign_geo_points(&geo_points, distance_threshold_km);
    let geo_cluster_count = builders.len();
    builders.extend(bucket_label_points(&label_points));

    let mut clusters: Vec<PlaceCluster> = builders.into_iter().map(ClusterBuilder::build).collect();
    clusters.sort_by(|a, b| b.visit_count.cmp(&a.visit_count));

    debug!(
        "Clustered {} points ({} geo, {} label-only) into {} places ({} geo)",
        points.len(),
        geo_points.len(),
        label_points.len(),
        clusters.len(),
        geo_cluster_count
    );

    clusters
}

/// Normalize a label for bucketing: trimmed, lowercase, `"unknown"` when empty.
pub fn normalize_label(label: &str) -> String {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        UNKNOWN_LABEL.to_string()
    } else {
        trimmed.to_lowercase()
    }
}

// ============================================================================
// Cluster Construction
// ============================================================================

#[derive(Debug, Default)]
struct ClusterBuilder {
    members: Vec<TrackPoint>,
    sum_lat: f64,
    sum_lng: f64,
    geo_count: usize,
    label_key: Option<String>,
}

impl ClusterBuilder {
    fn push(&mut self, point: TrackPoint) {
        if let Some(location) = point.location {
            self.sum_lat += location.latitude;
            self.sum_lng += location.longitude;
            self.geo_count += 1;
        }
        self.members.push(point);
    }

    /// Mean of the geo members assigned so far.
    fn current_centroid(&self) -> Option<GpsPoint> {
        if self.geo_count == 0 {
            return None;
        }
        let n = self.geo_count as f64;
        Some(GpsPoint::new(self.sum_lat / n, self.sum_lng / n))
    }

    fn build(self) -> PlaceCluster {
        let geo_members: Vec<GpsPoint> = self.members.iter().filter_map(|p| p.location).collect();
        let centroid = compute_center(&geo_members);

        PlaceCluster {
            centroid,
            representative_label: representative_label(&self.members),
            label_key: self.label_key,
            visit_count: self.members.len() as u32,
            visit_dates: visit_dates(&self.members),
            time_range: time_range(&self.members),
            members: self.members,
            address: None,
        }
    }
}

/// Current cluster centroid stored in the R-tree.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CentroidEntry {
    cluster: usize,
    lat: f64,
    lng: f64,
}

impl CentroidEntry {
    fn new(cluster: usize, centroid: GpsPoint) -> Self {
        Self {
            cluster,
            lat: centroid.latitude,
            lng: centroid.longitude,
        }
    }
}

impl RTreeObject for CentroidEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lng, self.lat])
    }
}

fn assign_geo_points(points: &[&TrackPoint], threshold_km: f64) -> Vec<ClusterBuilder> {
    let mut clusters: Vec<ClusterBuilder> = Vec::new();
    let mut index: RTree<CentroidEntry> = RTree::new();

    for point in points {
        let Some(location) = point.location else {
            continue;
        };

        let idx = match first_cluster_within(&clusters, &index, &location, threshold_km) {
            Some(idx) => {
                if let Some(old) = clusters[idx].current_centroid().filter(is_finite) {
                    index.remove(&CentroidEntry::new(idx, old));
                }
                idx
            }
            None => {
                clusters.push(ClusterBuilder::default());
                clusters.len() - 1
            }
        };

        clusters[idx].push((*point).clone());
        // Non-finite centroids never match anything, and rstar cannot index them
        if let Some(centroid) = clusters[idx].current_centroid().filter(is_finite) {
            index.insert(CentroidEntry::new(idx, centroid));
        }
    }

    clusters
}

fn is_finite(point: &GpsPoint) -> bool {
    point.latitude.is_finite() && point.longitude.is_finite()
}

/// Lowest-index cluster whose current centroid is within `threshold_km`.
///
/// The R-tree only narrows the candidates; picking the minimum index keeps the
/// result identical to scanning clusters in creation order.
fn first_cluster_within(
    clusters: &[ClusterBuilder],
    index: &RTree<CentroidEntry>,
    location: &GpsPoint,
    threshold_km: f64,
) -> Option<usize> {
    if !is_finite(location) {
        return None;
    }
    match search_envelope(location, threshold_km) {
        Some(envelope) => index
            .locate_in_envelope(&envelope)
            .filter(|e| haversine_km(location, &GpsPoint::new(e.lat, e.lng)) <= threshold_km)
            .map(|e| e.cluster)
            .min(),
        None => clusters.iter().position(|c| {
            c.current_centroid()
                .is_some_and(|centroid| haversine_km(location, &centroid) <= threshold_km)
        }),
    }
}

fn bucket_label_points(points: &[&TrackPoint]) -> Vec<ClusterBuilder> {
    let mut buckets: Vec<ClusterBuilder> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for point in points {
        let key = normalize_label(&point.label);
        let idx = *by_key.entry(key.clone()).or_insert_with(|| {
            buckets.push(ClusterBuilder {
                label_key: Some(key),
                ..ClusterBuilder::default()
            });
            buckets.len() - 1
        });
        buckets[idx].push((*point).clone());
    }

    buckets
}

fn representative_label(members: &[TrackPoint]) -> Option<String> {
    // label -> (count, first position)
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (pos, member) in members.iter().enumerate() {
        let label = member.label.trim();
        if label.is_empty() {
            continue;
        }
        counts.entry(label).or_insert((0, pos)).0 += 1;
    }

    counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(label, _)| label.to_string())
}

fn visit_dates(members: &[TrackPoint]) -> Vec<String> {
    members
        .iter()
        .map(|m| m.date.trim())
        .filter(|d| !d.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn time_range(members: &[TrackPoint]) -> Option<TimeRange> {
    members
        .iter()
        .filter_map(|m| m.start_time())
        .fold(None, |range: Option<(&str, &str)>, start| match range {
            None => Some((start, start)),
            Some((earliest, latest)) => Some((earliest.min(start), latest.max(start))),
        })
        .map(|(earliest, latest)| TimeRange {
            earliest: earliest.to_string(),
            latest: latest.to_string(),
        })
}

// ============================================================================
// Tests
// ============================================================================
