//! Tests for home/work geofence exclusion

use frequent_places::geo_utils::haversine_km;
use frequent_places::{cluster_places, cluster_points, exclude_home_places, ClusterOptions, GpsPoint, TrackPoint};

fn visits(n: usize, label: &str, lat: f64, lng: f64) -> Vec<TrackPoint> {
    (0..n)
        .map(|_| TrackPoint::new("2025-03-01", "10:00", label, Some(GpsPoint::new(lat, lng))))
        .collect()
}

fn label_visits(n: usize, label: &str) -> Vec<TrackPoint> {
    (0..n).map(|_| TrackPoint::new("2025-03-01", "", label, None)).collect()
}

fn names(places: &[frequent_places::PlaceCluster]) -> Vec<&str> {
    places.iter().filter_map(|p| p.representative_label.as_deref()).collect()
}

#[test]
fn test_home_work_and_surroundings_removed() {
    let mut points = Vec::new();
    points.extend(visits(5, "Home", 0.0, 0.0));
    points.extend(visits(4, "Work", 0.0, 0.01)); // ~1.1 km from home
    points.extend(visits(3, "Corner shop", 0.0, 0.0015)); // ~167 m from home
    points.extend(visits(2, "Park", 0.0, 0.05));
    points.extend(label_visits(1, "Gym"));

    let places = cluster_places(&points, &ClusterOptions::default());
    assert_eq!(names(&places), vec!["Park", "Gym"]);
}

#[test]
fn test_merged_center_moves_the_geofence() {
    let mut points = Vec::new();
    points.extend(visits(3, "Home", 0.0, 0.0));
    points.extend(visits(2, "Work", 0.0, 0.004)); // ~445 m: centers merge at lng 0.0016
    points.extend(visits(1, "Bakery", 0.0, -0.0012)); // ~133 m from home, ~311 m from merged center

    let places = cluster_places(&points, &ClusterOptions::default());
    assert_eq!(names(&places), vec!["Bakery"]);
}

#[test]
fn test_respects_limit() {
    let mut points = Vec::new();
    points.extend(visits(10, "Home", 0.0, 0.0));
    points.extend(visits(9, "Work", 1.0, 1.0));
    for i in 0..6 {
        points.extend(visits(2, "Place", 10.0 + i as f64, 10.0));
    }

    let places = cluster_places(&points, &ClusterOptions::default());
    assert_eq!(places.len(), 3);
    assert!(places.iter().all(|p| p.visit_count == 2));
}

#[test]
fn test_label_only_clusters_only_excluded_by_rank() {
    let mut points = Vec::new();
    points.extend(label_visits(5, "Home"));
    points.extend(visits(4, "Cafe", 0.0, 0.0));
    points.extend(visits(1, "Kiosk", 0.0, 0.001)); // ~111 m, its own cluster

    let options = ClusterOptions {
        exclude_top_n: 1,
        ..ClusterOptions::default()
    };
    let places = cluster_places(&points, &options);

    // The excluded label-only cluster has no centroid, so no geofence exists
    assert_eq!(names(&places), vec!["Cafe", "Kiosk"]);
}

#[test]
fn test_label_only_clusters_survive_geofence() {
    let mut points = Vec::new();
    points.extend(visits(5, "Home", 0.0, 0.0));
    points.extend(visits(4, "Work", 0.0, 0.01));
    points.extend(label_visits(2, "Somewhere at home"));

    let places = cluster_places(&points, &ClusterOptions::default());
    assert_eq!(names(&places), vec!["Somewhere at home"]);
}

#[test]
fn test_zero_top_n_keeps_everything() {
    let mut points = Vec::new();
    points.extend(visits(3, "A", 0.0, 0.0));
    points.extend(visits(2, "B", 1.0, 0.0));

    let options = ClusterOptions {
        exclude_top_n: 0,
        ..ClusterOptions::default()
    };
    assert_eq!(names(&cluster_places(&points, &options)), vec!["A", "B"]);
}

#[test]
fn test_top_n_covering_all_clusters_returns_empty() {
    let points = visits(3, "A", 0.0, 0.0);
    let clusters = cluster_points(&points, 0.1);

    let options = ClusterOptions {
        exclude_top_n: 5,
        ..ClusterOptions::default()
    };
    assert!(exclude_home_places(clusters, &options).is_empty());
}

#[test]
fn test_disabled_geofence_keeps_home() {
    let mut points = Vec::new();
    points.extend(visits(5, "Home", 0.0, 0.0));
    points.extend(visits(4, "Work", 0.0, 0.01));
    points.extend(visits(3, "Corner shop", 0.0, 0.0015));

    let options = ClusterOptions {
        exclude_home_geofence: false,
        ..ClusterOptions::default()
    };
    assert_eq!(names(&cluster_places(&points, &options)), vec!["Home", "Work", "Corner shop"]);
}

#[test]
fn test_never_returns_places_inside_geofence() {
    let mut points = Vec::new();
    points.extend(visits(8, "Home", 45.0, 7.0));
    points.extend(visits(7, "Work", 45.01, 7.01));
    // A ring of single-visit places at ~120-300 m from home
    for i in 0..12 {
        let angle = i as f64 * std::f64::consts::PI / 6.0;
        let r = 0.0011 + 0.0002 * i as f64;
        points.extend(visits(1, "Ring", 45.0 + r * angle.sin(), 7.0 + r * angle.cos()));
    }

    let options = ClusterOptions {
        limit: 20,
        ..ClusterOptions::default()
    };
    let clusters = cluster_points(&points, options.distance_threshold_km);
    let home = clusters[0].centroid.unwrap();
    let work = clusters[1].centroid.unwrap();
    let places = exclude_home_places(clusters, &options);

    assert!(!places.is_empty());
    assert!(places.len() <= 20);
    for place in &places {
        let c = place.centroid.unwrap();
        assert!(haversine_km(&home, &c) > options.geofence_radius_km);
        assert!(haversine_km(&work, &c) > options.geofence_radius_km);
        assert_eq!(place.representative_label.as_deref(), Some("Ring"));
    }
}
