#![allow(missing_docs)]

mod common;

use std::sync::Arc;
use std::thread;

use common::{assert_runs_well_formed, collect_rows};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rlestore::{RleStore, Value};

const WRITERS: u64 = 4;
const PER_WRITER: u64 = 500;
const SEED: u64 = 0x5eed_cafe;

#[test]
fn concurrent_appends_get_unique_indices() {
    let store: Arc<RleStore<u64>> = Arc::new(RleStore::new());
    let mut indices: Vec<u64> = thread::scope(|scope| {
        let handles: Vec<_> = (0..WRITERS)
            .map(|writer| {
                let store = Arc::clone(&store);
                scope.spawn(move || {
                    (0..PER_WRITER)
                        .map(|i| store.append(writer * 10 + i % 3))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().expect("writer thread"))
            .collect()
    });

    indices.sort_unstable();
    let expected: Vec<u64> = (0..WRITERS * PER_WRITER).collect();
    assert_eq!(indices, expected);
    assert_eq!(store.row_count(), WRITERS * PER_WRITER);
    assert_runs_well_formed(&store);
}

#[test]
fn readers_see_consistent_snapshots() {
    let store: Arc<RleStore> = Arc::new(RleStore::new());
    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    let values: Vec<Value> = (0..2_000)
        .map(|_| Value::Int(rng.gen_range(0..4)))
        .collect();

    thread::scope(|scope| {
        let writer = Arc::clone(&store);
        let feed = values.clone();
        scope.spawn(move || {
            for value in feed {
                writer.append(value);
            }
        });
        for _ in 0..3 {
            let reader = Arc::clone(&store);
            let expected = values.as_slice();
            scope.spawn(move || {
                for _ in 0..50 {
                    let rows = collect_rows(&reader);
                    assert_eq!(rows.as_slice(), &expected[..rows.len()]);
                }
            });
        }
    });

    assert_eq!(collect_rows(&store), values);
    assert_runs_well_formed(&store);
}

#[test]
fn read_while_iterating_elsewhere() {
    let source = RleStore::from_values((0i64..1_000).map(|i| i / 7));
    let mut image = Vec::new();
    source.write(&mut image).expect("write image");

    let target: Arc<RleStore<i64>> = Arc::new(RleStore::from_values([1, 2, 3]));
    thread::scope(|scope| {
        let loader = Arc::clone(&target);
        let image = image.as_slice();
        scope.spawn(move || {
            for _ in 0..20 {
                loader.read(image).expect("read image");
            }
        });
        let observer = Arc::clone(&target);
        scope.spawn(move || {
            for _ in 0..200 {
                let rows = collect_rows(&observer);
                assert!(
                    rows == vec![1, 2, 3] || rows.len() == 1_000,
                    "observed a partially loaded store with {} rows",
                    rows.len()
                );
            }
        });
    });
    assert_eq!(target.to_vec(), source.to_vec());
}
