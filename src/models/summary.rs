use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Derived statistics for one session. Recomputed on demand by
/// [`SessionStore::summarize`](crate::store::SessionStore::summarize).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_count: usize,
    pub total_volume_m3: f64,
    /// Keyed by species id; `BTreeMap` so the serialized form is stable.
    pub by_species: BTreeMap<String, SpeciesAggregate>,
    pub duration_ms: i64,
    /// Mean time per measurement, `duration_ms / total_count`; 0 when the
    /// session has no measurements.
    pub avg_measurement_time_ms: i64,
}

/// Per-species slice of a summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesAggregate {
    pub count: usize,
    pub volume_m3: f64,
    pub avg_diameter_cm: f64,
    pub avg_height_m: f64,
}
