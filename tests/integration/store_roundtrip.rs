#![allow(missing_docs)]

mod common;

use std::fs;

use common::{assert_runs_well_formed, assert_same_store, collect_rows};
use rlestore::store::MAGIC;
use rlestore::{Result, RleError, RleStore, StoreOptions, Value};
use tempfile::tempdir;

fn sample_store() -> RleStore {
    let store = RleStore::new();
    store.extend([
        Value::from("Value 1"),
        Value::from("Value 1"),
        Value::Null,
        Value::Int(-5),
        Value::Int(-5),
        Value::Int(-5),
        Value::Float(0.25),
        Value::record([("id", Value::UInt(7)), ("tag", Value::from("x"))]),
        Value::record([("id", Value::UInt(7)), ("tag", Value::from("x"))]),
        Value::List(vec![Value::Bool(true), Value::Bytes(vec![0, 255])]),
    ]);
    store
}

#[test]
fn save_and_load_file() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("column.rle");
    let source = sample_store();
    assert_runs_well_formed(&source);
    source.save_to_path(&path)?;

    let bytes = fs::read(&path)?;
    assert_eq!(&bytes[..MAGIC.len()], MAGIC);

    let target = RleStore::new();
    assert!(target.load_from_path(&path)?);
    assert_same_store(&source, &target);
    assert_eq!(collect_rows(&target), source.to_vec());
    assert_eq!(target.run_count(), 6);
    Ok(())
}

#[test]
fn save_overwrites_existing_file() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("column.rle");
    sample_store().save_to_path(&path)?;

    let smaller = RleStore::from_values(vec![Value::Bool(false); 4]);
    smaller.save_to_path(&path)?;

    let target: RleStore = RleStore::new();
    target.load_from_path(&path)?;
    assert_eq!(target.row_count(), 4);
    assert_eq!(target.run_count(), 1);
    let leftovers: Vec<_> = fs::read_dir(dir.path())?.collect();
    assert_eq!(leftovers.len(), 1, "temporary file left behind");
    Ok(())
}

#[test]
fn load_missing_file_is_noop() -> Result<()> {
    let dir = tempdir()?;
    let store = RleStore::from_values([Value::Int(1)]);
    assert!(!store.load_from_path(dir.path().join("absent.rle"))?);
    assert!(!store.load_from_path(dir.path())?);
    assert_eq!(store.row_count(), 1);
    Ok(())
}

#[test]
fn invalid_file_keeps_content() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("bad.rle");
    fs::write(&path, b"Invalid Data")?;

    let store = sample_store();
    let before = store.runs();
    let err = store.load_from_path(&path).unwrap_err();
    assert!(matches!(err, RleError::BadMagic));
    assert!(err.is_format_error());
    assert_eq!(store.runs(), before);
    Ok(())
}

#[test]
fn corrupted_run_is_rejected() -> Result<()> {
    let source = RleStore::from_values([Value::Int(1), Value::Int(2)]);
    let mut buf = Vec::new();
    source.write(&mut buf)?;
    // Last byte is the zigzag payload of the second run's value; make it
    // equal to the first so the runs should have been merged.
    let last = buf.len() - 1;
    buf[last] = 2;

    let target = RleStore::from_values([Value::from("kept")]);
    let err = target.read(buf.as_slice()).unwrap_err();
    assert!(matches!(err, RleError::Corruption(_)), "{err}");
    assert_eq!(target.to_vec(), vec![Value::from("kept")]);
    Ok(())
}

#[test]
fn decode_limits_apply_to_reads() -> Result<()> {
    let source = RleStore::from_values([Value::from("x".repeat(100))]);
    let mut buf = Vec::new();
    source.write(&mut buf)?;

    let strict: RleStore = RleStore::with_options(StoreOptions::new().max_len(16));
    let err = strict.read(buf.as_slice()).unwrap_err();
    assert!(matches!(err, RleError::Corruption(_)));
    assert!(strict.is_empty());

    let relaxed: RleStore = RleStore::with_options(StoreOptions::new().max_len(100));
    relaxed.read(buf.as_slice())?;
    assert_same_store(&source, &relaxed);
    Ok(())
}

#[test]
fn typed_store_rejects_other_kinds() -> Result<()> {
    let source = RleStore::from_values([Value::from("text")]);
    let mut buf = Vec::new();
    source.write(&mut buf)?;

    let typed: RleStore<i64> = RleStore::new();
    let err = typed.read(buf.as_slice()).unwrap_err();
    assert!(matches!(
        err,
        RleError::TypeMismatch {
            expected: "int",
            found: "string"
        }
    ));

    let strings: RleStore<String> = RleStore::new();
    strings.read(buf.as_slice())?;
    assert_eq!(strings.to_vec(), vec!["text".to_string()]);
    Ok(())
}
