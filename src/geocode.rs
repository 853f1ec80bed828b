//! Reverse geocoding hooks.
//!
//! The crate never performs lookups itself. Callers plug in a
//! [`ReverseGeocoder`] (an HTTP client, an offline table, a closure in tests)
//! and optionally wrap it in a [`GeocodeCache`] that they own.

use std::collections::{HashMap, VecDeque};

use log::debug;

use crate::clustering::PlaceCluster;
use crate::GpsPoint;

/// Turns coordinates into a human-readable address.
pub trait ReverseGeocoder {
    /// Look up an address. `None` means no result, not an error.
    fn reverse_geocode(&mut self, point: &GpsPoint) -> Option<String>;
}

impl<F> ReverseGeocoder for F
where
    F: FnMut(&GpsPoint) -> Option<String>,
{
    fn reverse_geocode(&mut self, point: &GpsPoint) -> Option<String> {
        self(point)
    }
}

/// Coordinates rounded to 1e-4 degrees (~11 m).
type CacheKey = (i64, i64);

fn cache_key(point: &GpsPoint) -> CacheKey {
    (
        (point.latitude * 1e4).round() as i64,
        (point.longitude * 1e4).round() as i64,
    )
}

/// Bounded cache in front of a geocoder.
///
/// Lookups are keyed by coordinates rounded to ~11 m. Negative results are
/// cached as well. When full, the oldest inserted entry is evicted (FIFO).
/// A capacity of zero disables caching.
#[derive(Debug)]
pub struct GeocodeCache<G> {
    inner: G,
    capacity: usize,
    entries: HashMap<CacheKey, Option<String>>,
    order: VecDeque<CacheKey>,
    hits: u64,
    misses: u64,
}

impl<G: ReverseGeocoder> GeocodeCache<G> {
    pub const DEFAULT_CAPACITY: usize = 1024;

    pub fn new(inner: G) -> Self {
        Self::with_capacity(inner, Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(inner: G, capacity: usize) -> Self {
        Self {
            inner,
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn into_inner(self) -> G {
        self.inner
    }

    fn insert(&mut self, key: CacheKey, value: Option<String>) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
        self.order.push_back(key);
        self.entries.insert(key, value);
    }
}

impl<G: ReverseGeocoder> ReverseGeocoder for GeocodeCache<G> {
    fn reverse_geocode(&mut self, point: &GpsPoint) -> Option<String> {
        let key = cache_key(point);
        if let Some(cached) = self.entries.get(&key) {
            self.hits += 1;
            return cached.clone();
        }

        self.misses += 1;
        let result = self.inner.reverse_geocode(point);
        self.insert(key, result.clone());
        result
    }
}

/// Attach addresses to places that have a centroid and no address yet.
///
/// Returns how many places received an address.
pub fn annotate_places<G: ReverseGeocoder + ?Sized>(places: &mut [PlaceCluster], geocoder: &mut G) -> usize {
    let mut annotated = 0;
    for place in places.iter_mut() {
        if place.address.is_some() {
            continue;
        }
        let Some(centroid) = place.centroid else {
            continue;
        };
        if let Some(address) = geocoder.reverse_geocode(&centroid) {
            place.address = Some(address);
            annotated += 1;
        }
    }
    debug!("Annotated {}/{} places with addresses", annotated, places.len());
    annotated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_hits_nearby_coordinates() {
        let mut calls = 0;
        let mut cache = GeocodeCache::new(|_: &GpsPoint| {
            calls += 1;
            Some("Plaza Mayor".to_string())
        });

        let a = cache.reverse_geocode(&GpsPoint::new(21.10001, -101.60001));
        let b = cache.reverse_geocode(&GpsPoint::new(21.10002, -101.60002));
        assert_eq!(a.as_deref(), Some("Plaza Mayor"));
        assert_eq!(a, b);
        assert_eq!(cache.stats(), (1, 1));
        drop(cache);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_cache_keeps_negative_results() {
        let mut cache = GeocodeCache::new(|_: &GpsPoint| None::<String>);
        assert!(cache.reverse_geocode(&GpsPoint::new(0.0, 0.0)).is_none());
        assert!(cache.reverse_geocode(&GpsPoint::new(0.0, 0.0)).is_none());
        assert_eq!(cache.stats(), (1, 1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_evicts_oldest_entry() {
        let mut cache = GeocodeCache::with_capacity(|p: &GpsPoint| Some(format!("{:.1}", p.latitude)), 2);
        cache.reverse_geocode(&GpsPoint::new(1.0, 0.0));
        cache.reverse_geocode(&GpsPoint::new(2.0, 0.0));
        cache.reverse_geocode(&GpsPoint::new(3.0, 0.0));
        assert_eq!(cache.len(), 2);

        // 1.0 was evicted, so this is a miss; 3.0 is still cached
        cache.reverse_geocode(&GpsPoint::new(1.0, 0.0));
        cache.reverse_geocode(&GpsPoint::new(3.0, 0.0));
        assert_eq!(cache.stats(), (1, 4));
    }

    #[test]
    fn test_zero_capacity_disables_cache() {
        let mut cache = GeocodeCache::with_capacity(|_: &GpsPoint| Some("x".to_string()), 0);
        cache.reverse_geocode(&GpsPoint::new(1.0, 0.0));
        cache.reverse_geocode(&GpsPoint::new(1.0, 0.0));
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), (0, 2));
    }
}
