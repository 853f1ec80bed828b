//! Tests for the track point boundary: construction, JSON and errors

use frequent_places::{GpsPoint, TrackError, TrackPoint, TrackRecord};

#[test]
fn test_json_point_with_coordinates() {
    let json = r#"{"date":"2025-01-01","time":"08:00 to 08:30","label":"Mercado","latitude":21.12,"longitude":-101.68,"sourceKey":"t1"}"#;
    let point: TrackPoint = serde_json::from_str(json).unwrap();

    assert_eq!(point.location, Some(GpsPoint::new(21.12, -101.68)));
    assert_eq!(point.start_time(), Some("08:00"));
    assert_eq!(point.source_key, "t1");
}

#[test]
fn test_json_missing_fields_default_to_empty() {
    let point: TrackPoint = serde_json::from_str(r#"{"label":"Gym"}"#).unwrap();
    assert!(!point.is_geolocated());
    assert_eq!(point.date, "");
    assert_eq!(point.time, "");
}

#[test]
fn test_json_partial_coordinates_rejected() {
    let result: Result<TrackPoint, _> = serde_json::from_str(r#"{"date":"2025-01-01","latitude":21.12}"#);
    let err = result.unwrap_err();
    assert!(err.to_string().contains("Partial coordinates"));
}

#[test]
fn test_json_out_of_range_rejected() {
    let result: Result<TrackPoint, _> = serde_json::from_str(r#"{"latitude":120.0,"longitude":0.0}"#);
    assert!(result.is_err());
}

#[test]
fn test_json_round_trip_uses_flat_shape() {
    let point = TrackPoint::new("2025-01-01", "08:00", "Home", Some(GpsPoint::new(1.5, 2.5))).with_source_key("k");
    let value = serde_json::to_value(&point).unwrap();

    assert_eq!(value["latitude"], 1.5);
    assert_eq!(value["longitude"], 2.5);
    assert_eq!(value["sourceKey"], "k");
    assert_eq!(serde_json::from_value::<TrackPoint>(value).unwrap(), point);
}

#[test]
fn test_record_json_is_flat() {
    let record = TrackRecord {
        id: "abc".to_string(),
        point: TrackPoint::new("2025-01-01", "", "Gym", None),
    };
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["id"], "abc");
    assert_eq!(value["label"], "Gym");
    assert!(value["latitude"].is_null());

    let back: TrackRecord = serde_json::from_value(value).unwrap();
    assert_eq!(back, record);
}

#[test]
fn test_error_display() {
    let err = TrackError::InvalidCoordinates {
        latitude: 91.0,
        longitude: 0.0,
    };
    assert!(err.to_string().contains("91"));

    let err = TrackError::invalid_option("limit", "too small");
    assert_eq!(err.to_string(), "Invalid option limit: too small");
}
