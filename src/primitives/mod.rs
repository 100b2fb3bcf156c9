//! Low-level primitives shared by the store.
//!
//! Includes varint encoding and atomic file I/O.

/// Byte-level utilities and encoding/decoding.
///
/// Varint and zigzag helpers used by the store codec.
pub mod bytes;

/// I/O abstractions and utilities.
///
/// File presence checks and atomic replace-on-write.
pub mod io;
