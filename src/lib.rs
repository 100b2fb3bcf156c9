//! Run-length encoded, append-only value store.
//!
//! [`RleStore`] keeps a growing sequence of rows as runs of identical values
//! and moves its whole image through a compact, magic-tagged byte stream.

#![warn(missing_docs)]

pub mod cli;
pub mod logging;
pub mod primitives;
pub mod store;
pub mod types;

pub use store::{
    DecodeLimits, RleStore, Run, StoreOptions, StoreStats, StoredValue, Value, ValueKind,
};
pub use types::{Result, RleError};
