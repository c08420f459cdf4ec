//! timbertally — standing-tree timber volume estimation and survey sessions.
//!
//! The library has three layers:
//!
//! - pure computation: [`validate`] (input-domain checks) and [`volume`]
//!   (the closed-form allometric estimator over the [`species`] catalog)
//! - the [`store::SessionStore`] aggregate, which runs the pipeline and
//!   accumulates measurements into [`models::SurveySession`] records
//! - the [`db::Database`] SQLite repository behind the
//!   [`store::SessionRepository`] boundary
//!
//! Capture transport (voice, forms), export formatting, and rendering live
//! outside this crate; callers hand the store a validated
//! `(species, diameter, height)` triple and get back the updated session.

pub mod db;
pub mod error;
pub mod models;
pub mod species;
pub mod store;
pub mod validate;
pub mod volume;
