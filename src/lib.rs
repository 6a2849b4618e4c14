//! Badger - test outcome badges for folders
//!
//! Badger decorates test output directories with pass/fail badges based on
//! `.pass` / `.fail` marker files, and watches a workspace for newly created
//! test output folders, keeping a single notification that points at the
//! newest one.

pub mod config;
pub mod decoration;
pub mod host;
pub mod watch;
