//! Merge two overlapping location-history uploads and print the top places.
//!
//! Run with: cargo run --example place_report

use frequent_places::{
    annotate_places, cluster_places, merge_new_points, ClusterOptions, GeocodeCache, GpsPoint, TrackPoint,
};

fn visit(date: &str, time: &str, label: &str, lat: f64, lng: f64) -> TrackPoint {
    TrackPoint::new(date, time, label, Some(GpsPoint::new(lat, lng)))
}

fn january() -> Vec<TrackPoint> {
    let mut points = Vec::new();
    for day in 1..=20 {
        let date = format!("2025-01-{:02}", day);
        points.push(visit(&date, "07:30 to 08:00", "Home", 21.1219, -101.6826));
        points.push(visit(&date, "09:00 to 17:00", "Office", 21.1450, -101.6900));
        if day % 3 == 0 {
            points.push(visit(&date, "18:30 to 19:30", "Climbing gym", 21.1600, -101.7100));
        }
        if day % 5 == 0 {
            points.push(visit(&date, "20:00 to 21:00", "Taquería", 21.1225, -101.6830));
        }
    }
    points.push(TrackPoint::new("2025-01-11", "13:00", "Mercado Aldama", None));
    points.push(TrackPoint::new("2025-01-18", "13:30", "mercado aldama", None));
    points
}

fn february_export() -> Vec<TrackPoint> {
    // The second export overlaps the last days of January
    let mut points: Vec<TrackPoint> = january().into_iter().filter(|p| p.date.as_str() >= "2025-01-15").collect();
    for day in 1..=5 {
        let date = format!("2025-02-{:02}", day);
        points.push(visit(&date, "10:00 to 12:00", "Library", 21.1300, -101.6700));
    }
    points
}

fn main() {
    let first = merge_new_points(&[], &january(), "takeout-2025-01.json");
    println!("Upload 1: {:?}", first.report);

    let second = merge_new_points(&first.admitted, &february_export(), "takeout-2025-02.json");
    println!("Upload 2: {:?}\n", second.report);

    let history: Vec<TrackPoint> = first
        .admitted
        .into_iter()
        .chain(second.admitted)
        .map(|record| record.point)
        .collect();

    let options = ClusterOptions {
        limit: 5,
        ..ClusterOptions::default()
    };
    let mut places = cluster_places(&history, &options);

    let mut geocoder = GeocodeCache::new(|p: &GpsPoint| Some(format!("near {:.3}, {:.3}", p.latitude, p.longitude)));
    annotate_places(&mut places, &mut geocoder);

    println!("Top places (home/work excluded):");
    for (rank, place) in places.iter().enumerate() {
        let range = place
            .time_range
            .as_ref()
            .map(|r| format!("{}-{}", r.earliest, r.latest))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}. {} ({} visits on {} days, {})",
            rank + 1,
            place.display_name().unwrap_or("unnamed"),
            place.visit_count,
            place.visit_dates.len(),
            range
        );
    }
}
