//! Input-domain validation for raw field measurements.
//!
//! The rules model how the measurements are actually taken: calipers read
//! diameter at breast height in even 2 cm steps, so odd or fractional
//! diameters are recording mistakes, not unusual trees. Validation happens
//! before any species is consulted; species-specific envelope checks belong
//! to the estimator.

use serde::Serialize;

use crate::error::InputError;

pub const MIN_DIAMETER_CM: f64 = 6.0;
pub const MAX_DIAMETER_CM: f64 = 200.0;
pub const MIN_HEIGHT_M: f64 = 1.0;
pub const MAX_HEIGHT_M: f64 = 100.0;

/// Outcome of validating one `(diameter, height)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<InputError>,
}

impl ValidationResult {
    fn ok() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    fn fail(error: InputError) -> Self {
        Self {
            is_valid: false,
            error: Some(error),
        }
    }
}

/// Validate a measurement pair. Rules apply in order, first failure wins:
///
/// 1. both values must be finite (non-NaN, non-infinite)
/// 2. diameter must be an even integer in `[6, 200]` cm
/// 3. height must lie in `[1, 100]` m
pub fn validate_measurement_input(diameter_cm: f64, height_m: f64) -> ValidationResult {
    if !diameter_cm.is_finite() {
        return ValidationResult::fail(InputError::DiameterNotFinite);
    }
    if !height_m.is_finite() {
        return ValidationResult::fail(InputError::HeightNotFinite);
    }

    if !(MIN_DIAMETER_CM..=MAX_DIAMETER_CM).contains(&diameter_cm) {
        return ValidationResult::fail(InputError::DiameterOutOfBounds);
    }
    if diameter_cm.fract() != 0.0 || (diameter_cm as i64) % 2 != 0 {
        return ValidationResult::fail(InputError::DiameterNotEven);
    }

    if !(MIN_HEIGHT_M..=MAX_HEIGHT_M).contains(&height_m) {
        return ValidationResult::fail(InputError::HeightOutOfBounds);
    }

    ValidationResult::ok()
}

/// Parse one raw text field (manual or voice entry) into a number.
///
/// Accepts a decimal comma, which is how heights arrive from dictation in
/// locales that use one. Returns `None` for anything that is not a finite
/// number; callers map that to the `Format` failure kind.
pub fn parse_measurement(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => None,
    }
}
