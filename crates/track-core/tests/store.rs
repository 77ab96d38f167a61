use std::fs;

use chrono::{Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use track_core::store::{Store, StoreError, TimerState};
use track_core::task_ops;
use track_core::timer;

#[test]
fn missing_file_yields_a_fresh_document() {
    let temp = TempDir::new().expect("tempdir");
    let store = Store::open(temp.path().join("store.json")).expect("open");
    assert!(store.doc.projects.is_empty());
    assert_eq!(store.doc.state, TimerState::Idle);
    assert!(!store.is_dirty());
}

#[test]
fn save_then_open_round_trips_field_for_field() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("store.json");
    let noon = Utc
        .with_ymd_and_hms(2026, 8, 24, 12, 0, 0)
        .single()
        .expect("timestamp");

    let mut store = Store::open(path.clone()).expect("open");
    timer::add(&mut store.doc, "web", "docs", Duration::minutes(30), noon).expect("add");
    task_ops::tag(
        &mut store.doc,
        "web",
        "docs",
        &["b".to_string(), "a".to_string()],
        false,
    );
    timer::start(&mut store.doc, "web", "deploy", noon + Duration::hours(1)).expect("start");
    store.mark_dirty();
    store.save().expect("save");
    assert!(!store.is_dirty());

    let reloaded = Store::open(path).expect("reopen");
    assert_eq!(reloaded.doc, store.doc);
    assert!(!reloaded.is_dirty());
}

#[test]
fn save_is_skipped_until_marked_dirty() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("store.json");
    let mut store = Store::open(path.clone()).expect("open");
    store.save().expect("save");
    assert!(!path.exists());

    store.mark_dirty();
    store.save().expect("save");
    assert!(path.exists());
    // The temp file from the atomic write does not linger.
    assert!(!temp.path().join("store.json.tmp").exists());
}

#[test]
fn save_creates_the_data_directory() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("nested").join("dir").join("store.json");
    let mut store = Store::open(path.clone()).expect("open");
    store.mark_dirty();
    store.save().expect("save");
    assert!(path.exists());
}

#[test]
fn corrupt_file_is_a_loud_error() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("store.json");
    fs::write(&path, "{ not json").expect("write");

    let err = Store::open(path.clone()).expect_err("corrupt");
    assert!(matches!(err, StoreError::Corrupt { .. }));
    assert!(err.to_string().contains("corrupt"));
    // The file is left alone for the user to inspect or edit.
    assert_eq!(fs::read_to_string(&path).expect("read"), "{ not json");
}

#[test]
fn running_state_uses_the_flagged_wire_shape() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("store.json");
    let start = Utc
        .with_ymd_and_hms(2026, 8, 24, 9, 0, 0)
        .single()
        .expect("timestamp");

    let mut store = Store::open(path.clone()).expect("open");
    timer::start(&mut store.doc, "web", "docs", start).expect("start");
    store.mark_dirty();
    store.save().expect("save");

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
    let state = &raw["state"];
    assert_eq!(state["running"], serde_json::Value::Bool(true));
    assert_eq!(state["project"], "web");
    assert_eq!(state["task"], "docs");
    assert!(state["start"].is_string());

    let frames = &raw["projects"]["web"]["tasks"]["docs"]["frames"];
    assert!(frames.as_array().expect("frames").is_empty());
}

#[test]
fn legacy_documents_without_frame_ids_are_backfilled() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("store.json");
    fs::write(
        &path,
        r#"{
          "projects": {
            "web": { "tasks": { "docs": {
              "frames": [
                { "start": "2026-08-24T09:00:00Z", "end": "2026-08-24T09:30:00Z" }
              ],
              "tags": ["a"]
            } } }
          },
          "state": { "running": false }
        }"#,
    )
    .expect("write");

    let store = Store::open(path).expect("open");
    let frame = &store.doc.projects["web"].tasks["docs"].frames[0];
    assert!(!frame.id.is_empty());
    assert_eq!(frame.duration_ms(), 30 * 60 * 1000);
    // Backfilled ids must reach disk on the next save.
    assert!(store.is_dirty());
}

#[test]
fn running_state_missing_fields_is_corrupt() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("store.json");
    fs::write(&path, r#"{ "projects": {}, "state": { "running": true } }"#).expect("write");
    let err = Store::open(path).expect_err("corrupt");
    assert!(matches!(err, StoreError::Corrupt { .. }));
}

#[test]
fn absent_optional_fields_default() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("store.json");
    fs::write(&path, r#"{ "projects": { "web": {} } }"#).expect("write");

    let store = Store::open(path).expect("open");
    assert_eq!(store.doc.state, TimerState::Idle);
    assert!(store.doc.projects["web"].tasks.is_empty());
}
