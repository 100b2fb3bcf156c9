#![forbid(unsafe_code)]

//! Command-line operations over persisted stores.
//!
//! The `rlestore` binary is a thin clap front end; everything it does lives
//! here so it can be exercised without spawning a process.

/// Build, inspect, dump, and run listing over store files.
pub mod commands;
