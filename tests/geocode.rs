//! Tests for address annotation

use std::collections::HashMap;

use frequent_places::{
    annotate_places, cluster_places, ClusterOptions, GeocodeCache, GpsPoint, ReverseGeocoder, TrackPoint,
};

/// Offline lookup table keyed by whole-degree cells.
struct TableGeocoder {
    table: HashMap<(i32, i32), String>,
    lookups: usize,
}

impl ReverseGeocoder for TableGeocoder {
    fn reverse_geocode(&mut self, point: &GpsPoint) -> Option<String> {
        self.lookups += 1;
        let cell = (point.latitude.floor() as i32, point.longitude.floor() as i32);
        self.table.get(&cell).cloned()
    }
}

fn points() -> Vec<TrackPoint> {
    let mut points = Vec::new();
    for _ in 0..3 {
        points.push(TrackPoint::new("2025-01-01", "", "", Some(GpsPoint::new(21.12, -101.68))));
    }
    points.push(TrackPoint::new("2025-01-01", "", "Museo", Some(GpsPoint::new(19.43, -99.13))));
    points.push(TrackPoint::new("2025-01-01", "", "Gym", None));
    points
}

#[test]
fn test_annotate_places_with_table() {
    let options = ClusterOptions {
        exclude_home_geofence: false,
        ..ClusterOptions::default()
    };
    let mut places = cluster_places(&points(), &options);

    let mut table = HashMap::new();
    table.insert((21, -102), "León, Guanajuato".to_string());
    let mut geocoder = GeocodeCache::new(TableGeocoder { table, lookups: 0 });

    let annotated = annotate_places(&mut places, &mut geocoder);
    assert_eq!(annotated, 1);
    assert_eq!(places[0].address.as_deref(), Some("León, Guanajuato"));
    assert_eq!(places[0].display_name(), Some("León, Guanajuato"));

    // Label-only places are never looked up
    assert_eq!(geocoder.stats(), (0, 2));

    // A second pass only retries the place without an address, from cache
    annotate_places(&mut places, &mut geocoder);
    assert_eq!(geocoder.stats(), (1, 2));
    assert_eq!(geocoder.into_inner().lookups, 2);
}

#[test]
fn test_display_name_prefers_label() {
    let options = ClusterOptions {
        exclude_home_geofence: false,
        ..ClusterOptions::default()
    };
    let mut places = cluster_places(&points(), &options);
    let mut everywhere = |_: &GpsPoint| Some("Somewhere".to_string());
    annotate_places(&mut places, &mut everywhere);

    let museo = places.iter().find(|p| p.representative_label.as_deref() == Some("Museo")).unwrap();
    assert_eq!(museo.display_name(), Some("Museo"));

    let gym = places.iter().find(|p| p.is_label_only()).unwrap();
    assert_eq!(gym.address, None);
    assert_eq!(gym.display_name(), Some("Gym"));
}
