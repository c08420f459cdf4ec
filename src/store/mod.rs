//! Session aggregate operations.
//!
//! [`SessionStore`] owns the survey lifecycle: it runs the validation and
//! estimation pipeline, applies mutations to one session at a time, and
//! delegates durability to a [`SessionRepository`]. Every operation is
//! load-mutate-save; on any validation or estimation failure nothing is
//! written, so persisted state never holds a partial append.
//!
//! Concurrency: one logical caller per session. The store performs no
//! locking or merging; if two writers race on the same id the repository's
//! last write wins at the record level.

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::*;
use crate::validate::validate_measurement_input;
use crate::volume::{estimate_volume, CalculationResult};

/// Durable key-value persistence for sessions.
///
/// Assumed durable and strongly consistent per key; no transactional
/// guarantees across keys are required. Implementations decide how the
/// record is laid out — the store only needs structural round-tripping,
/// measurement order included.
pub trait SessionRepository {
    fn load(&self, id: Uuid) -> Result<Option<SurveySession>>;
    fn save(&self, session: &SurveySession) -> Result<()>;
    fn delete(&self, id: Uuid) -> Result<bool>;
    /// All sessions, newest first.
    fn list(&self) -> Result<Vec<SurveySession>>;
    /// Sessions without an end timestamp, newest first.
    fn list_active(&self) -> Result<Vec<SurveySession>>;
}

/// A freshly appended measurement together with its estimation diagnostics.
///
/// The warning is not a failure: the record has been persisted, but the
/// caller must surface `OutOfRange`/`InvalidResult` instead of silently
/// trusting the stored volume.
#[derive(Debug, Clone)]
pub struct AppendResult {
    pub measurement: Measurement,
    pub calculation: CalculationResult,
}

pub struct SessionStore<R: SessionRepository> {
    repo: R,
}

impl<R: SessionRepository> SessionStore<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_session(&self, kind: SessionKind) -> Result<SurveySession, StoreError> {
        let session = SurveySession {
            id: Uuid::new_v4(),
            kind,
            started_at_ms: now_ms(),
            ended_at_ms: None,
            measurements: Vec::new(),
            height_mode: HeightMode::PerTree,
            average_heights: None,
            is_paused: false,
            location: None,
            location_data: None,
            notes: None,
        };
        self.repo.save(&session)?;
        tracing::info!(session = %session.id, kind = kind.as_str(), "created survey session");
        Ok(session)
    }

    pub fn session(&self, id: Uuid) -> Result<SurveySession, StoreError> {
        self.repo.load(id)?.ok_or(StoreError::NotFound(id))
    }

    pub fn all_sessions(&self) -> Result<Vec<SurveySession>, StoreError> {
        Ok(self.repo.list()?)
    }

    pub fn active_sessions(&self) -> Result<Vec<SurveySession>, StoreError> {
        Ok(self.repo.list_active()?)
    }

    /// Validate, estimate, and append one measurement.
    ///
    /// Fails with [`StoreError::SessionClosed`] on ended sessions. A paused
    /// session still accepts appends — pausing only suppresses automatic
    /// capture in the surrounding UI.
    pub fn append_measurement(
        &self,
        id: Uuid,
        species_id: &str,
        diameter_cm: f64,
        height_m: f64,
    ) -> Result<AppendResult, StoreError> {
        let mut session = self.open_for_mutation(id)?;

        let validation = validate_measurement_input(diameter_cm, height_m);
        if let Some(error) = validation.error {
            return Err(StoreError::InvalidInput(error));
        }

        let calculation = estimate_volume(species_id, diameter_cm, height_m)?;

        let measurement = Measurement {
            id: Uuid::new_v4(),
            species_id: species_id.to_string(),
            diameter_cm,
            height_m,
            volume_m3: calculation.volume_m3,
            captured_at_ms: now_ms(),
        };

        session.measurements.push(measurement.clone());
        self.repo.save(&session)?;

        tracing::debug!(
            session = %id,
            species = species_id,
            volume_m3 = calculation.volume_m3,
            in_range = calculation.is_in_range,
            "appended measurement"
        );

        Ok(AppendResult {
            measurement,
            calculation,
        })
    }

    /// Remove the most recently appended measurement. Returns `None` (and
    /// does not touch the repository) when the list is already empty, so a
    /// repeated undo affordance never errors.
    pub fn undo_last(&self, id: Uuid) -> Result<Option<Measurement>, StoreError> {
        let mut session = self.open_for_mutation(id)?;

        let Some(removed) = session.measurements.pop() else {
            return Ok(None);
        };

        self.repo.save(&session)?;
        tracing::debug!(session = %id, measurement = %removed.id, "undid last measurement");
        Ok(Some(removed))
    }

    /// Pause an active session. No-op if already paused.
    pub fn pause(&self, id: Uuid) -> Result<SurveySession, StoreError> {
        let mut session = self.open_for_mutation(id)?;
        if !session.is_paused {
            session.is_paused = true;
            self.repo.save(&session)?;
        }
        Ok(session)
    }

    /// Resume a paused session. No-op if already running.
    pub fn resume(&self, id: Uuid) -> Result<SurveySession, StoreError> {
        let mut session = self.open_for_mutation(id)?;
        if session.is_paused {
            session.is_paused = false;
            self.repo.save(&session)?;
        }
        Ok(session)
    }

    /// End a session: terminal, no further mutation is accepted.
    pub fn end(&self, id: Uuid) -> Result<SurveySession, StoreError> {
        let mut session = self.open_for_mutation(id)?;

        // The clock is only monotonic-enough; never let the end timestamp
        // precede the start.
        session.ended_at_ms = Some(now_ms().max(session.started_at_ms));
        session.is_paused = false;
        self.repo.save(&session)?;

        tracing::info!(
            session = %id,
            measurements = session.measurements.len(),
            "ended survey session"
        );
        Ok(session)
    }

    /// Recompute the derived summary in a single pass over the measurements.
    pub fn summarize(&self, id: Uuid) -> Result<SessionSummary, StoreError> {
        let session = self.session(id)?;
        Ok(summarize_session(&session))
    }

    /// Merge optional metadata fields into the session. The id and start
    /// timestamp are not part of [`SessionPatch`] and stay immutable.
    pub fn update_metadata(
        &self,
        id: Uuid,
        patch: SessionPatch,
    ) -> Result<SurveySession, StoreError> {
        let mut session = self.open_for_mutation(id)?;

        if let Some(location) = patch.location {
            session.location = Some(location);
        }
        if let Some(location_data) = patch.location_data {
            session.location_data = Some(location_data);
        }
        if let Some(notes) = patch.notes {
            session.notes = Some(notes);
        }
        if let Some(height_mode) = patch.height_mode {
            session.height_mode = height_mode;
        }
        if let Some(average_heights) = patch.average_heights {
            session.average_heights = Some(average_heights);
        }

        self.repo.save(&session)?;
        Ok(session)
    }

    /// Record the stand height for one species, used in average height mode.
    pub fn set_average_height(
        &self,
        id: Uuid,
        species_id: &str,
        height_m: f64,
    ) -> Result<SurveySession, StoreError> {
        let mut session = self.open_for_mutation(id)?;
        session
            .average_heights
            .get_or_insert_with(Default::default)
            .insert(species_id.to_string(), height_m);
        self.repo.save(&session)?;
        Ok(session)
    }

    pub fn set_height_mode(
        &self,
        id: Uuid,
        mode: HeightMode,
    ) -> Result<SurveySession, StoreError> {
        let mut session = self.open_for_mutation(id)?;
        session.height_mode = mode;
        self.repo.save(&session)?;
        Ok(session)
    }

    /// Delete a session outright. Returns `false` if no such session existed.
    pub fn delete_session(&self, id: Uuid) -> Result<bool, StoreError> {
        let deleted = self.repo.delete(id)?;
        if deleted {
            tracing::info!(session = %id, "deleted survey session");
        }
        Ok(deleted)
    }

    /// Load a session and reject mutation once it has ended.
    fn open_for_mutation(&self, id: Uuid) -> Result<SurveySession, StoreError> {
        let session = self.session(id)?;
        if session.is_ended() {
            return Err(StoreError::SessionClosed(id));
        }
        Ok(session)
    }
}

/// Single-pass summary computation, grouping by species id.
pub fn summarize_session(session: &SurveySession) -> SessionSummary {
    let mut by_species: std::collections::BTreeMap<String, SpeciesAggregate> = Default::default();
    let mut total_volume_m3 = 0.0;

    for m in &session.measurements {
        total_volume_m3 += m.volume_m3;
        let entry = by_species
            .entry(m.species_id.clone())
            .or_insert(SpeciesAggregate {
                count: 0,
                volume_m3: 0.0,
                avg_diameter_cm: 0.0,
                avg_height_m: 0.0,
            });
        // Accumulate sums; divided into means below.
        entry.count += 1;
        entry.volume_m3 += m.volume_m3;
        entry.avg_diameter_cm += m.diameter_cm;
        entry.avg_height_m += m.height_m;
    }

    for aggregate in by_species.values_mut() {
        let n = aggregate.count as f64;
        aggregate.avg_diameter_cm /= n;
        aggregate.avg_height_m /= n;
    }

    let total_count = session.measurements.len();
    let duration_ms = session.ended_at_ms.unwrap_or_else(now_ms) - session.started_at_ms;
    let avg_measurement_time_ms = if total_count == 0 {
        0
    } else {
        duration_ms / total_count as i64
    };

    SessionSummary {
        total_count,
        total_volume_m3,
        by_species,
        duration_ms,
        avg_measurement_time_ms,
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
