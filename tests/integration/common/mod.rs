#![allow(dead_code)]

use rlestore::{RleStore, StoredValue};

/// Expands a store through `iterate`, checking indices are dense and ordered.
pub fn collect_rows<V: StoredValue>(store: &RleStore<V>) -> Vec<V> {
    let mut rows = Vec::new();
    store.iterate(|idx, value| {
        assert_eq!(idx, rows.len() as u64, "iteration skipped or repeated a row");
        rows.push(value.clone());
    });
    rows
}

/// Asserts the run sequence is contiguous, non-empty, and minimal.
pub fn assert_runs_well_formed<V: StoredValue + std::fmt::Debug>(store: &RleStore<V>) {
    let runs = store.runs();
    let mut next = 0;
    for (i, run) in runs.iter().enumerate() {
        assert_eq!(run.start_row, next, "run {i} does not start where the previous ended");
        assert!(run.length > 0, "run {i} is empty");
        if i > 0 {
            assert!(
                !runs[i - 1].value.identical(&run.value),
                "runs {} and {i} hold identical values",
                i - 1
            );
        }
        next = run.end_row();
    }
    assert_eq!(next, store.row_count(), "runs do not cover every row");
    assert_eq!(runs.len() as u64, store.run_count());
}

/// Asserts two stores hold the same rows in the same runs.
pub fn assert_same_store<V: StoredValue + std::fmt::Debug>(left: &RleStore<V>, right: &RleStore<V>) {
    assert_eq!(left.row_count(), right.row_count(), "row counts differ");
    assert_eq!(left.run_count(), right.run_count(), "run counts differ");
    assert_eq!(left.runs(), right.runs(), "runs differ");
}
