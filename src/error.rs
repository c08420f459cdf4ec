use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Broad class of an input validation failure.
///
/// - `Format`: the value is not a usable finite number at all
/// - `Range`: the value parsed but falls outside the hard input domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputErrorKind {
    Format,
    Range,
}

/// A measurement input rejected before estimation was attempted.
///
/// Each variant carries a stable message key via [`InputError::message_key`]
/// so the presentation layer can localize without parsing error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum InputError {
    #[error("diameter is not a finite number")]
    DiameterNotFinite,
    #[error("height is not a finite number")]
    HeightNotFinite,
    #[error("diameter must be between 6 and 200 cm")]
    DiameterOutOfBounds,
    #[error("diameter must be an even whole number of centimeters")]
    DiameterNotEven,
    #[error("height must be between 1 and 100 m")]
    HeightOutOfBounds,
}

impl InputError {
    pub fn kind(&self) -> InputErrorKind {
        match self {
            Self::DiameterNotFinite | Self::HeightNotFinite => InputErrorKind::Format,
            Self::DiameterOutOfBounds | Self::DiameterNotEven | Self::HeightOutOfBounds => {
                InputErrorKind::Range
            }
        }
    }

    pub fn message_key(&self) -> &'static str {
        match self {
            Self::DiameterNotFinite => "measurement.diameter.not_a_number",
            Self::HeightNotFinite => "measurement.height.not_a_number",
            Self::DiameterOutOfBounds => "measurement.diameter.out_of_bounds",
            Self::DiameterNotEven => "measurement.diameter.not_even",
            Self::HeightOutOfBounds => "measurement.height.out_of_bounds",
        }
    }
}

/// Failures surfaced by [`SessionStore`](crate::store::SessionStore)
/// operations. All of these are recoverable by the caller: the session is
/// left unmodified and the operation may be retried with corrected input.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid measurement input: {0}")]
    InvalidInput(#[from] InputError),

    #[error("unknown species: {0}")]
    UnknownSpecies(String),

    #[error("session {0} has already ended")]
    SessionClosed(Uuid),

    #[error("session {0} not found")]
    NotFound(Uuid),

    #[error("repository error: {0}")]
    Repository(#[from] anyhow::Error),
}
