use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One measured tree within a survey session.
///
/// The volume is whatever the estimator produced at capture time; it is
/// stored rather than recomputed so that a later change to the species
/// catalog cannot silently rewrite historical surveys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub id: Uuid,
    pub species_id: String,
    /// Diameter at breast height, centimeters.
    pub diameter_cm: f64,
    /// Total tree height, meters.
    pub height_m: f64,
    /// Estimated volume, cubic meters.
    pub volume_m3: f64,
    /// Capture time, milliseconds since the Unix epoch.
    pub captured_at_ms: i64,
}
