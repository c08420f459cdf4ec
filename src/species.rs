//! Static registry of per-species allometric parameters.
//!
//! Each species carries the regression coefficients of its closed-form
//! volume formula plus the measurement envelope (diameter/height range)
//! over which those coefficients were fitted. Estimates outside the
//! envelope are still computed but flagged as extrapolated.

use serde::Serialize;

/// Regression coefficients and measurement envelope for one species.
///
/// An absent upper bound means the fit is considered open-ended in that
/// direction, not that a numeric sentinel applies.
#[derive(Debug, Clone, Serialize)]
pub struct SpeciesParameters {
    /// Stable identifier used as the key in sessions and summaries.
    pub species_id: &'static str,
    pub display_name: &'static str,
    /// Single-letter forestry code kept for continuity with older exports.
    pub code: &'static str,
    pub p1: f64,
    pub p2: f64,
    pub p3: f64,
    pub p4: f64,
    pub k: f64,
    pub min_diameter_cm: f64,
    pub max_diameter_cm: Option<f64>,
    /// Must exceed 1.3 m; the formula's height correction divides by h − 1.3.
    pub min_height_m: f64,
    pub max_height_m: Option<f64>,
}

impl SpeciesParameters {
    /// True when both measurements fall inside this species' fitted envelope.
    pub fn envelope_contains(&self, diameter_cm: f64, height_m: f64) -> bool {
        let diameter_ok = diameter_cm >= self.min_diameter_cm
            && self.max_diameter_cm.is_none_or(|max| diameter_cm <= max);
        let height_ok = height_m >= self.min_height_m
            && self.max_height_m.is_none_or(|max| height_m <= max);
        diameter_ok && height_ok
    }
}

const CATALOG: &[SpeciesParameters] = &[
    SpeciesParameters {
        species_id: "beech",
        display_name: "European beech",
        code: "B",
        p1: 0.0001,
        p2: 0.00002,
        p3: 0.001,
        p4: 0.0005,
        k: 2.0,
        min_diameter_cm: 6.0,
        max_diameter_cm: Some(80.0),
        min_height_m: 5.0,
        max_height_m: Some(40.0),
    },
    SpeciesParameters {
        species_id: "sessile_oak",
        display_name: "Sessile oak",
        code: "KST",
        p1: 0.00014,
        p2: 0.000018,
        p3: 0.0012,
        p4: 0.00045,
        k: 1.8,
        min_diameter_cm: 6.0,
        max_diameter_cm: Some(90.0),
        min_height_m: 4.0,
        max_height_m: Some(36.0),
    },
    SpeciesParameters {
        species_id: "pedunculate_oak",
        display_name: "Pedunculate oak",
        code: "KT",
        p1: 0.00015,
        p2: 0.000017,
        p3: 0.0011,
        p4: 0.0005,
        k: 1.8,
        min_diameter_cm: 6.0,
        max_diameter_cm: Some(100.0),
        min_height_m: 4.0,
        max_height_m: Some(38.0),
    },
    SpeciesParameters {
        species_id: "black_locust",
        display_name: "Black locust",
        code: "A",
        p1: 0.0002,
        p2: 0.000015,
        p3: 0.0009,
        p4: 0.00055,
        k: 1.5,
        min_diameter_cm: 6.0,
        max_diameter_cm: Some(60.0),
        min_height_m: 4.0,
        max_height_m: Some(30.0),
    },
    SpeciesParameters {
        species_id: "spruce",
        display_name: "Norway spruce",
        code: "LF",
        p1: 0.00025,
        p2: 0.000012,
        p3: 0.0008,
        p4: 0.0004,
        k: 1.6,
        min_diameter_cm: 6.0,
        max_diameter_cm: Some(70.0),
        min_height_m: 5.0,
        max_height_m: None,
    },
];

/// Look up the parameters for a species identifier.
pub fn get(species_id: &str) -> Option<&'static SpeciesParameters> {
    CATALOG.iter().find(|s| s.species_id == species_id)
}

/// All registered species, in catalog order.
pub fn all() -> &'static [SpeciesParameters] {
    CATALOG
}
