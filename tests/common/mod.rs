#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use chrono::{TimeZone, Utc};
use formset_core::{
    form::{Field, FormKind, RowKey, RowSeed},
    utils::clock::{Clock, FixedClock},
    view::ViewKind,
    FormSession, SessionOptions,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates a unique directory that outlives the calling test.
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

pub fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
    ))
}

pub fn session(kind: FormKind) -> FormSession {
    session_with(kind, Vec::new())
}

pub fn session_with(kind: FormKind, seeds: Vec<RowSeed>) -> FormSession {
    FormSession::with_seeds(
        SessionOptions {
            kind,
            prefix: "items".into(),
            clock: fixed_clock(),
            ..SessionOptions::default()
        },
        seeds,
    )
}

pub fn key_at(session: &FormSession, index: usize) -> RowKey {
    session
        .store()
        .at_index(index)
        .expect("row at index")
        .key()
}

/// Types `value` into the desktop view.
pub fn edit(session: &mut FormSession, key: RowKey, field: Field, value: &str) {
    session
        .on_field_edited(ViewKind::Desktop, key, field, value)
        .expect("edit row");
}

pub fn assert_contiguous(session: &FormSession) {
    let indices: Vec<usize> = session.store().rows().iter().map(|row| row.index()).collect();
    let expected: Vec<usize> = (0..session.store().len()).collect();
    assert_eq!(indices, expected);
}
