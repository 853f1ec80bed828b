//! Home/work geofence filtering.
//!
//! The most visited places are assumed to be home or work. They are removed
//! from the ranking outright, and every other place whose centroid falls
//! inside a circular geofence around them is removed as well. Geofence
//! centers that sit close together (a home and the parking lot next to it)
//! are first consolidated into one visit-weighted center.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::clustering::{ClusterOptions, PlaceCluster};
use crate::geo_utils::distance_km;

/// A circular exclusion zone derived from one or more excluded places.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeofenceCenter {
    pub lat: f64,
    pub lon: f64,
    /// Total visit count of the contributing places
    pub weight: u32,
}

impl GeofenceCenter {
    fn distance_km_to(&self, lat: f64, lon: f64) -> f64 {
        distance_km(self.lat, self.lon, lat, lon)
    }
}

/// Remove home/work places and their surroundings from a ranked cluster list.
///
/// `clusters` must already be sorted by descending visit count, as returned
/// by [`cluster_points`](crate::cluster_points). The first `exclude_top_n`
/// entries are dropped; when there are no more clusters than that, nothing
/// survives. Label-only clusters have no centroid and can only be removed by
/// the positional exclusion. At most `limit` clusters are returned, in order.
pub fn exclude_home_places(clusters: Vec<PlaceCluster>, options: &ClusterOptions) -> Vec<PlaceCluster> {
    let top_n = options.exclude_top_n as usize;
    let limit = options.limit as usize;

    if top_n >= clusters.len() {
        debug!(
            "Geofence: exclude_top_n={} covers all {} clusters, nothing left",
            top_n,
            clusters.len()
        );
        return vec![];
    }

    let centers: Vec<GeofenceCenter> = clusters[..top_n]
        .iter()
        .filter_map(|cluster| {
            cluster.centroid.map(|c| GeofenceCenter {
                lat: c.latitude,
                lon: c.longitude,
                weight: cluster.visit_count,
            })
        })
        .collect();
    let centers = consolidate_centers(&centers, options.merge_radius_km);

    let total = clusters.len();
    let result: Vec<PlaceCluster> = clusters
        .into_iter()
        .skip(top_n)
        .filter(|cluster| match cluster.centroid {
            Some(c) => !centers
                .iter()
                .any(|center| center.distance_km_to(c.latitude, c.longitude) <= options.geofence_radius_km),
            None => true,
        })
        .take(limit)
        .collect();

    debug!(
        "Geofence: {} clusters, {} excluded by rank, {} geofence centers, {} returned",
        total,
        top_n,
        centers.len(),
        result.len()
    );

    result
}

/// Consolidate geofence centers in a single greedy pass.
///
/// Each center not yet absorbed collects every later unabsorbed center within
/// `merge_radius_km` of its own original position and is replaced by their
/// visit-weighted centroid. The pass is not repeated, so two output centers
/// can still end up closer than `merge_radius_km`.
pub fn consolidate_centers(centers: &[GeofenceCenter], merge_radius_km: f64) -> Vec<GeofenceCenter> {
    let mut processed = vec![false; centers.len()];
    let mut merged = Vec::with_capacity(centers.len());

    for (i, center) in centers.iter().enumerate() {
        if processed[i] {
            continue;
        }
        processed[i] = true;

        let mut group = vec![*center];
        for (j, other) in centers.iter().enumerate().skip(i + 1) {
            if !processed[j] && center.distance_km_to(other.lat, other.lon) <= merge_radius_km {
                processed[j] = true;
                group.push(*other);
            }
        }

        merged.push(weighted_center(&group));
    }

    merged
}

fn weighted_center(group: &[GeofenceCenter]) -> GeofenceCenter {
    if let [single] = group {
        return *single;
    }

    let weight: u32 = group.iter().map(|c| c.weight).sum();
    if weight == 0 {
        // Only reachable with hand-built centers; fall back to a plain mean
        let n = group.len() as f64;
        return GeofenceCenter {
            lat: group.iter().map(|c| c.lat).sum::<f64>() / n,
            lon: group.iter().map(|c| c.lon).sum::<f64>() / n,
            weight,
        };
    }

    let w = weight as f64;
    GeofenceCenter {
        lat: group.iter().map(|c| c.lat * c.weight as f64).sum::<f64>() / w,
        lon: group.iter().map(|c| c.lon * c.weight as f64).sum::<f64>() / w,
        weight,
    }
}
