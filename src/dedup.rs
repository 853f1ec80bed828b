//! # Incremental Deduplication
//!
//! Decides which points of a freshly parsed batch are new relative to the
//! accumulated history.
//!
//! Every point has two identities:
//!
//! - a [`DedupKey`], the `(date, time, latitude, longitude)` tuple of the
//!   observation itself, and
//! - a record id, a truncated SHA-256 of the batch source key plus the same
//!   fields, which is what collaborators persist.
//!
//! A candidate is skipped when either identity is already known. Admitted
//! candidates are added to the known sets immediately, so repeats inside one
//! batch are caught too.
//!
//! ```rust
//! use frequent_places::{GpsPoint, TrackPoint, merge_new_points};
//!
//! let batch = vec![
//!     TrackPoint::new("2025-01-01", "08:00", "", Some(GpsPoint::new(21.1, -101.6))),
//!     TrackPoint::new("2025-01-01", "08:00", "", Some(GpsPoint::new(21.1, -101.6))),
//! ];
//!
//! let first = merge_new_points(&[], &batch, "upload-1");
//! assert_eq!(first.report.admitted_count, 1);
//! assert_eq!(first.report.skipped_count, 1);
//!
//! let again = merge_new_points(&first.admitted, &batch, "upload-1");
//! assert_eq!(again.report.admitted_count, 0);
//! ```

use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{TrackPoint, TrackRecord};

/// Length of the hex record id.
pub const RECORD_ID_LEN: usize = 16;

/// Identity of an observation, independent of which batch delivered it.
///
/// Coordinates are compared by exact bit pattern, after folding `-0.0`
/// into `0.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    date: String,
    time: String,
    coordinates: Option<(u64, u64)>,
}

impl DedupKey {
    /// Build the key of a track point.
    pub fn of(point: &TrackPoint) -> Self {
        Self {
            date: point.date.clone(),
            time: point.time.clone(),
            coordinates: point
                .location
                .map(|p| (canonical(p.latitude).to_bits(), canonical(p.longitude).to_bits())),
        }
    }
}

/// Both zeros are the same coordinate.
fn canonical(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        value
    }
}

/// Stable record id for a point delivered by batch `source_key`.
///
/// Absent coordinates hash as empty strings, so malformed points still get
/// a deterministic id. Each field is length-prefixed, so separators inside
/// a field cannot shift bytes into its neighbour.
pub fn record_id(source_key: &str, point: &TrackPoint) -> String {
    let (lat, lng) = match point.location {
        Some(p) => (canonical(p.latitude).to_string(), canonical(p.longitude).to_string()),
        None => (String::new(), String::new()),
    };

    let mut hasher = Sha256::new();
    for field in [source_key, point.date.as_str(), point.time.as_str(), lat.as_str(), lng.as_str()] {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }

    let mut id = format!("{:x}", hasher.finalize());
    id.truncate(RECORD_ID_LEN);
    id
}

/// Counts describing one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct MergeReport {
    pub admitted_count: u32,
    pub skipped_count: u32,
    pub total_before: u32,
    pub total_after: u32,
}

/// Admitted records plus the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct MergeOutcome {
    /// New records in input order, stamped with the batch source key
    pub admitted: Vec<TrackRecord>,
    pub report: MergeReport,
}

/// Merge a batch of incoming points against existing history.
///
/// Never fails: every candidate is hashable, and validation is left to
/// whoever parsed the batch.
pub fn merge_new_points(existing: &[TrackRecord], incoming: &[TrackPoint], source_key: &str) -> MergeOutcome {
    let candidates = incoming
        .iter()
        .map(|point| (record_id(source_key, point), DedupKey::of(point)));
    admit(existing, incoming, candidates, source_key)
}

/// Same as [`merge_new_points`], hashing the batch with rayon.
///
/// The admit pass stays sequential so the outcome is identical.
#[cfg(feature = "parallel")]
pub fn merge_new_points_parallel(
    existing: &[TrackRecord],
    incoming: &[TrackPoint],
    source_key: &str,
) -> MergeOutcome {
    use rayon::prelude::*;

    let candidates: Vec<(String, DedupKey)> = incoming
        .par_iter()
        .map(|point| (record_id(source_key, point), DedupKey::of(point)))
        .collect();
    admit(existing, incoming, candidates, source_key)
}

fn admit(
    existing: &[TrackRecord],
    incoming: &[TrackPoint],
    candidates: impl IntoIterator<Item = (String, DedupKey)>,
    source_key: &str,
) -> MergeOutcome {
    let mut known_ids: HashSet<String> = existing.iter().map(|r| r.id.clone()).collect();
    let mut known_keys: HashSet<DedupKey> = existing.iter().map(|r| DedupKey::of(&r.point)).collect();

    let mut admitted = Vec::new();
    let mut skipped = 0u32;

    for (point, (id, key)) in incoming.iter().zip(candidates) {
        if known_ids.contains(&id) || known_keys.contains(&key) {
            skipped += 1;
            continue;
        }

        known_ids.insert(id.clone());
        known_keys.insert(key);

        let mut point = point.clone();
        point.source_key = source_key.to_string();
        admitted.push(TrackRecord { id, point });
    }

    let total_before = existing.len() as u32;
    let admitted_count = admitted.len() as u32;
    let report = MergeReport {
        admitted_count,
        skipped_count: skipped,
        total_before,
        total_after: total_before + admitted_count,
    };

    debug!(
        "Merged batch '{}': {} admitted, {} skipped, {} -> {} records",
        source_key, report.admitted_count, report.skipped_count, report.total_before, report.total_after
    );

    MergeOutcome { admitted, report }
}
