//! Domain models for timbertally.
//!
//! # Core Concepts
//!
//! - [`SurveySession`]: one continuous field survey — an ordered list of
//!   tree measurements plus lifecycle state (active/paused/ended) and
//!   location metadata. Sessions are the unit of persistence.
//! - [`Measurement`]: one measured tree. Created only by the session
//!   store's estimation pipeline, never hand-constructed with an arbitrary
//!   volume; immutable once appended except for whole-record tail undo.
//! - [`SessionSummary`]: derived statistics over a session. Always
//!   recomputable from the measurement list, never a source of truth.

mod measurement;
mod session;
mod summary;

pub use measurement::*;
pub use session::*;
pub use summary::*;
