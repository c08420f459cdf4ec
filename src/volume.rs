//! Closed-form standing-tree volume estimation.
//!
//! The model is an allometric regression: per-species coefficients applied
//! to diameter at breast height and total height. The exact term order is
//! load-bearing — summaries are compared across devices, so two builds must
//! produce bit-identical volumes for identical inputs.

use serde::Serialize;

use crate::error::StoreError;
use crate::species;

/// The height correction term divides by `h − 1.3`; heights this close to
/// the breast-height datum make the formula numerically meaningless.
const HEIGHT_SINGULARITY_M: f64 = 1.3;
const SINGULARITY_EPSILON_M: f64 = 1e-6;

/// Diagnostic attached to a successful estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeWarning {
    /// The inputs fall outside the species' fitted envelope; the volume is
    /// an extrapolation and may be inaccurate.
    OutOfRange,
    /// The computation produced a non-finite or negative value; the volume
    /// has been clamped to zero and must not be trusted.
    InvalidResult,
}

impl VolumeWarning {
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::OutOfRange => "volume.warning.out_of_range",
            Self::InvalidResult => "volume.warning.invalid_result",
        }
    }
}

/// Result of one volume estimation.
///
/// A warning never fails the call: `OutOfRange` volumes are usable but
/// flagged, `InvalidResult` volumes are clamped to zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalculationResult {
    pub volume_m3: f64,
    pub is_in_range: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<VolumeWarning>,
}

impl CalculationResult {
    fn invalid() -> Self {
        Self {
            volume_m3: 0.0,
            is_in_range: false,
            warning: Some(VolumeWarning::InvalidResult),
        }
    }
}

/// Estimate the volume of one tree in cubic meters.
///
/// Pure and deterministic. The caller is expected to have run
/// [`validate_measurement_input`](crate::validate::validate_measurement_input)
/// first; this function still guards its own numeric domain so bad
/// parameters or near-singular heights can never leak a NaN downstream.
///
/// Formula, applied in exactly this term order:
///
/// ```text
/// term1 = p1 + p2·d·h + p3·d + p4·h
/// term2 = (h / (h − 1.3)) ^ k
/// term3 = d²·h / 10^8
/// volume = term1 · term2 · term3
/// ```
pub fn estimate_volume(
    species_id: &str,
    diameter_cm: f64,
    height_m: f64,
) -> Result<CalculationResult, StoreError> {
    let params = species::get(species_id)
        .ok_or_else(|| StoreError::UnknownSpecies(species_id.to_string()))?;

    if (height_m - HEIGHT_SINGULARITY_M).abs() < SINGULARITY_EPSILON_M {
        return Ok(CalculationResult::invalid());
    }

    let is_in_range = params.envelope_contains(diameter_cm, height_m);

    let d = diameter_cm;
    let h = height_m;

    let term1 = params.p1 + params.p2 * d * h + params.p3 * d + params.p4 * h;
    let term2 = (h / (h - HEIGHT_SINGULARITY_M)).powf(params.k);
    let term3 = (d * d * h) / 1e8;

    let volume_m3 = term1 * term2 * term3;

    if !volume_m3.is_finite() || volume_m3 < 0.0 {
        return Ok(CalculationResult::invalid());
    }

    if !is_in_range {
        return Ok(CalculationResult {
            volume_m3,
            is_in_range: false,
            warning: Some(VolumeWarning::OutOfRange),
        });
    }

    Ok(CalculationResult {
        volume_m3,
        is_in_range: true,
        warning: None,
    })
}
