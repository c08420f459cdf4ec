use std::collections::BTreeMap;

use speculate2::speculate;
use timbertally::db::Database;
use timbertally::error::{InputError, StoreError};
use timbertally::models::*;
use timbertally::store::{SessionRepository, SessionStore};
use uuid::Uuid;

fn open_store() -> SessionStore<Database> {
    let db = Database::open_memory().expect("Failed to create in-memory database");
    db.migrate().expect("Failed to run migrations");
    SessionStore::new(db)
}

speculate! {
    before {
        let store = open_store();
    }

    describe "create_session" {
        it "starts active, unpaused, and empty" {
            let session = store.create_session(SessionKind::Standing).expect("create failed");

            assert!(!session.is_paused);
            assert!(session.ended_at_ms.is_none());
            assert!(session.measurements.is_empty());
            assert_eq!(session.height_mode, HeightMode::PerTree);
        }

        it "is immediately loadable by id" {
            let created = store.create_session(SessionKind::Harvested).expect("create failed");
            let loaded = store.session(created.id).expect("load failed");
            assert_eq!(loaded, created);
        }
    }

    describe "append_measurement" {
        it "appends in insertion order and persists the estimate" {
            let session = store.create_session(SessionKind::Standing).expect("create failed");

            let first = store
                .append_measurement(session.id, "beech", 28.0, 17.0)
                .expect("append failed");
            let second = store
                .append_measurement(session.id, "spruce", 40.0, 20.0)
                .expect("append failed");

            let loaded = store.session(session.id).expect("load failed");
            assert_eq!(loaded.measurements.len(), 2);
            assert_eq!(loaded.measurements[0], first.measurement);
            assert_eq!(loaded.measurements[1], second.measurement);
            assert!(first.measurement.volume_m3 > 0.0);
            assert!(first.calculation.is_in_range);
        }

        it "rejects invalid input and leaves the session unmodified" {
            let session = store.create_session(SessionKind::Standing).expect("create failed");

            let err = store
                .append_measurement(session.id, "beech", 27.0, 17.0)
                .unwrap_err();
            assert!(matches!(err, StoreError::InvalidInput(InputError::DiameterNotEven)));

            let loaded = store.session(session.id).expect("load failed");
            assert!(loaded.measurements.is_empty());
        }

        it "rejects an unknown species and leaves the session unmodified" {
            let session = store.create_session(SessionKind::Standing).expect("create failed");

            let err = store
                .append_measurement(session.id, "sequoia", 28.0, 17.0)
                .unwrap_err();
            assert!(matches!(err, StoreError::UnknownSpecies(_)));

            let loaded = store.session(session.id).expect("load failed");
            assert!(loaded.measurements.is_empty());
        }

        it "still succeeds while the session is paused" {
            let session = store.create_session(SessionKind::Standing).expect("create failed");
            store.pause(session.id).expect("pause failed");

            store
                .append_measurement(session.id, "beech", 28.0, 17.0)
                .expect("append on paused session should succeed");
        }

        it "fails with SessionClosed once the session has ended" {
            let session = store.create_session(SessionKind::Standing).expect("create failed");
            store.end(session.id).expect("end failed");

            let err = store
                .append_measurement(session.id, "beech", 28.0, 17.0)
                .unwrap_err();
            assert!(matches!(err, StoreError::SessionClosed(id) if id == session.id));
        }

        it "surfaces the extrapolation warning while persisting the volume" {
            let session = store.create_session(SessionKind::Standing).expect("create failed");

            let appended = store
                .append_measurement(session.id, "beech", 120.0, 17.0)
                .expect("append failed");
            assert!(!appended.calculation.is_in_range);
            assert!(appended.measurement.volume_m3 > 0.0);

            let loaded = store.session(session.id).expect("load failed");
            assert_eq!(loaded.measurements.len(), 1);
        }

        it "fails with NotFound for a missing session" {
            let err = store
                .append_measurement(Uuid::new_v4(), "beech", 28.0, 17.0)
                .unwrap_err();
            assert!(matches!(err, StoreError::NotFound(_)));
        }
    }

    describe "undo_last" {
        it "removes only the most recent measurement" {
            let session = store.create_session(SessionKind::Standing).expect("create failed");
            let first = store
                .append_measurement(session.id, "beech", 28.0, 17.0)
                .expect("append failed");
            let second = store
                .append_measurement(session.id, "spruce", 40.0, 20.0)
                .expect("append failed");

            let removed = store.undo_last(session.id).expect("undo failed");
            assert_eq!(removed, Some(second.measurement));

            let loaded = store.session(session.id).expect("load failed");
            assert_eq!(loaded.measurements, vec![first.measurement]);
        }

        it "is a no-op on an empty measurement list" {
            let session = store.create_session(SessionKind::Standing).expect("create failed");
            let removed = store.undo_last(session.id).expect("undo should not error");
            assert!(removed.is_none());
        }
    }

    describe "pause and resume" {
        it "toggles the paused flag" {
            let session = store.create_session(SessionKind::Standing).expect("create failed");

            let paused = store.pause(session.id).expect("pause failed");
            assert!(paused.is_paused);

            let resumed = store.resume(session.id).expect("resume failed");
            assert!(!resumed.is_paused);
        }

        it "is idempotent within the active state" {
            let session = store.create_session(SessionKind::Standing).expect("create failed");

            store.pause(session.id).expect("pause failed");
            let still_paused = store.pause(session.id).expect("repeat pause should not error");
            assert!(still_paused.is_paused);

            store.resume(session.id).expect("resume failed");
            let still_running = store.resume(session.id).expect("repeat resume should not error");
            assert!(!still_running.is_paused);
        }

        it "rejects pause on an ended session" {
            let session = store.create_session(SessionKind::Standing).expect("create failed");
            store.end(session.id).expect("end failed");

            let err = store.pause(session.id).unwrap_err();
            assert!(matches!(err, StoreError::SessionClosed(_)));
        }
    }

    describe "end" {
        it "sets the terminal timestamp and clears the paused flag" {
            let session = store.create_session(SessionKind::Standing).expect("create failed");
            store.pause(session.id).expect("pause failed");

            let ended = store.end(session.id).expect("end failed");
            assert!(!ended.is_paused);
            let ended_at = ended.ended_at_ms.expect("end timestamp missing");
            assert!(ended_at >= ended.started_at_ms);
        }

        it "rejects a second end" {
            let session = store.create_session(SessionKind::Standing).expect("create failed");
            store.end(session.id).expect("end failed");

            let err = store.end(session.id).unwrap_err();
            assert!(matches!(err, StoreError::SessionClosed(_)));
        }
    }

    describe "summarize" {
        it "groups one beech and one spruce measurement by species" {
            let session = store.create_session(SessionKind::Standing).expect("create failed");
            let beech = store
                .append_measurement(session.id, "beech", 28.0, 17.0)
                .expect("append failed");
            let spruce = store
                .append_measurement(session.id, "spruce", 40.0, 20.0)
                .expect("append failed");

            let summary = store.summarize(session.id).expect("summarize failed");

            assert_eq!(summary.total_count, 2);
            let expected_total = beech.measurement.volume_m3 + spruce.measurement.volume_m3;
            assert!((summary.total_volume_m3 - expected_total).abs() < 1e-12);

            let beech_agg = &summary.by_species["beech"];
            assert_eq!(beech_agg.count, 1);
            assert_eq!(beech_agg.avg_diameter_cm, 28.0);
            assert_eq!(beech_agg.avg_height_m, 17.0);

            assert_eq!(summary.by_species["spruce"].count, 1);
        }

        it "averages diameter and height per species arithmetically" {
            let session = store.create_session(SessionKind::Standing).expect("create failed");
            store.append_measurement(session.id, "beech", 20.0, 15.0).expect("append failed");
            store.append_measurement(session.id, "beech", 30.0, 25.0).expect("append failed");

            let summary = store.summarize(session.id).expect("summarize failed");
            let beech_agg = &summary.by_species["beech"];
            assert_eq!(beech_agg.count, 2);
            assert_eq!(beech_agg.avg_diameter_cm, 25.0);
            assert_eq!(beech_agg.avg_height_m, 20.0);
        }

        it "yields an empty summary for a fresh session" {
            let session = store.create_session(SessionKind::Standing).expect("create failed");
            let summary = store.summarize(session.id).expect("summarize failed");

            assert_eq!(summary.total_count, 0);
            assert_eq!(summary.total_volume_m3, 0.0);
            assert!(summary.by_species.is_empty());
            assert_eq!(summary.avg_measurement_time_ms, 0);
        }

        it "uses the end timestamp for the duration of an ended session" {
            let session = store.create_session(SessionKind::Standing).expect("create failed");
            let ended = store.end(session.id).expect("end failed");

            let summary = store.summarize(session.id).expect("summarize failed");
            assert_eq!(
                summary.duration_ms,
                ended.ended_at_ms.unwrap() - ended.started_at_ms
            );
        }
    }

    describe "update_metadata" {
        it "merges supplied fields and keeps identity fields untouched" {
            let session = store.create_session(SessionKind::Standing).expect("create failed");

            let mut heights = BTreeMap::new();
            heights.insert("beech".to_string(), 18.5);

            let updated = store
                .update_metadata(
                    session.id,
                    SessionPatch {
                        location: Some("Compartment 42A".to_string()),
                        notes: Some("north slope".to_string()),
                        height_mode: Some(HeightMode::Average),
                        average_heights: Some(heights),
                        ..Default::default()
                    },
                )
                .expect("update failed");

            assert_eq!(updated.id, session.id);
            assert_eq!(updated.started_at_ms, session.started_at_ms);
            assert_eq!(updated.location.as_deref(), Some("Compartment 42A"));
            assert_eq!(updated.notes.as_deref(), Some("north slope"));
            assert_eq!(updated.height_mode, HeightMode::Average);
            assert_eq!(updated.average_heights.unwrap()["beech"], 18.5);
        }

        it "leaves omitted fields alone" {
            let session = store.create_session(SessionKind::Standing).expect("create failed");
            store
                .update_metadata(
                    session.id,
                    SessionPatch {
                        location: Some("Parcel 017".to_string()),
                        ..Default::default()
                    },
                )
                .expect("update failed");

            let updated = store
                .update_metadata(
                    session.id,
                    SessionPatch {
                        notes: Some("windthrow damage".to_string()),
                        ..Default::default()
                    },
                )
                .expect("update failed");

            assert_eq!(updated.location.as_deref(), Some("Parcel 017"));
            assert_eq!(updated.notes.as_deref(), Some("windthrow damage"));
        }
    }

    describe "height settings" {
        it "records per-species stand heights" {
            let session = store.create_session(SessionKind::Standing).expect("create failed");

            store.set_average_height(session.id, "beech", 19.0).expect("set failed");
            let updated = store.set_average_height(session.id, "spruce", 24.0).expect("set failed");

            let heights = updated.average_heights.expect("heights missing");
            assert_eq!(heights["beech"], 19.0);
            assert_eq!(heights["spruce"], 24.0);
        }

        it "switches the height mode" {
            let session = store.create_session(SessionKind::Standing).expect("create failed");
            let updated = store
                .set_height_mode(session.id, HeightMode::Average)
                .expect("set failed");
            assert_eq!(updated.height_mode, HeightMode::Average);
        }
    }

    describe "listing" {
        it "separates active from ended sessions" {
            let open = store.create_session(SessionKind::Standing).expect("create failed");
            let closed = store.create_session(SessionKind::Standing).expect("create failed");
            store.end(closed.id).expect("end failed");

            let active = store.active_sessions().expect("list failed");
            assert_eq!(active.len(), 1);
            assert_eq!(active[0].id, open.id);

            let all = store.all_sessions().expect("list failed");
            assert_eq!(all.len(), 2);
        }

        it "orders sessions newest first" {
            let older = store.create_session(SessionKind::Standing).expect("create failed");
            std::thread::sleep(std::time::Duration::from_millis(5));
            let newer = store.create_session(SessionKind::Standing).expect("create failed");

            let all = store.all_sessions().expect("list failed");
            assert_eq!(all[0].id, newer.id);
            assert_eq!(all[1].id, older.id);
        }
    }

    describe "delete_session" {
        it "removes the session" {
            let session = store.create_session(SessionKind::Standing).expect("create failed");
            assert!(store.delete_session(session.id).expect("delete failed"));

            let err = store.session(session.id).unwrap_err();
            assert!(matches!(err, StoreError::NotFound(_)));
        }

        it "returns false for a missing id" {
            assert!(!store.delete_session(Uuid::new_v4()).expect("delete failed"));
        }
    }

    describe "persistence round-trip" {
        it "survives reopening the database file" {
            let dir = tempfile::tempdir().expect("tempdir failed");
            let path = dir.path().join("roundtrip.db");

            let db = Database::open(path.clone()).expect("open failed");
            db.migrate().expect("migrate failed");
            let file_store = SessionStore::new(db);

            let session = file_store.create_session(SessionKind::Harvested).expect("create failed");
            file_store.append_measurement(session.id, "beech", 28.0, 17.0).expect("append failed");
            file_store.append_measurement(session.id, "spruce", 40.0, 20.0).expect("append failed");
            file_store
                .update_metadata(
                    session.id,
                    SessionPatch {
                        location: Some("Compartment 42A".to_string()),
                        ..Default::default()
                    },
                )
                .expect("update failed");
            let ended = file_store.end(session.id).expect("end failed");

            let reopened = Database::open(path).expect("reopen failed");
            reopened.migrate().expect("migrate failed");
            let loaded = reopened
                .load(ended.id)
                .expect("load failed")
                .expect("session missing after reopen");

            assert_eq!(loaded, ended);
            assert_eq!(loaded.measurements.len(), 2);
            assert_eq!(loaded.measurements[0].species_id, "beech");
            assert_eq!(loaded.measurements[1].species_id, "spruce");
        }
    }
}
