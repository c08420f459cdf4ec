use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Measurement;

/// One continuous field survey.
///
/// The measurement list is append-only with tail undo: records are never
/// reordered or edited in place, only pushed or popped. A session is
/// `Active` (possibly paused) until it is ended, after which every mutation
/// is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveySession {
    pub id: Uuid,
    pub kind: SessionKind,
    /// Survey start, milliseconds since the Unix epoch.
    pub started_at_ms: i64,
    /// Set exactly once, when the session ends. Always ≥ `started_at_ms`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at_ms: Option<i64>,
    pub measurements: Vec<Measurement>,
    pub height_mode: HeightMode,
    /// Per-species stand heights, used when `height_mode` is `Average`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_heights: Option<BTreeMap<String, f64>>,
    /// Pausing suppresses automatic capture in the surrounding UI; it does
    /// not block explicit appends. Forced to `false` when the session ends.
    pub is_paused: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_data: Option<LocationData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SurveySession {
    pub fn is_ended(&self) -> bool {
        self.ended_at_ms.is_some()
    }
}

/// What kind of timber is being surveyed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Standing,
    Harvested,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standing => "standing",
            Self::Harvested => "harvested",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "standing" => Some(Self::Standing),
            "harvested" => Some(Self::Harvested),
            _ => None,
        }
    }
}

/// How tree heights are captured.
///
/// - `PerTree`: every tree gets its own height measurement
/// - `Average`: one stand height per species, applied to every tree
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HeightMode {
    Average,
    PerTree,
}

impl HeightMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Average => "average",
            Self::PerTree => "per_tree",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "average" => Some(Self::Average),
            "per_tree" => Some(Self::PerTree),
            _ => None,
        }
    }
}

/// Where the survey took place, in forestry cadastre terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationData {
    pub kind: LocationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub municipality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forest_block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compartment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parcel_number: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    Compartment,
    Parcel,
}

/// Input for a partial metadata update. All fields are optional; the
/// session id and start timestamp have no counterpart here and therefore
/// cannot be patched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionPatch {
    pub location: Option<String>,
    pub location_data: Option<LocationData>,
    pub notes: Option<String>,
    pub height_mode: Option<HeightMode>,
    pub average_heights: Option<BTreeMap<String, f64>>,
}
