//! Integration tests for bwsave
//!
//! These drive the backup and restore pipelines end to end against a
//! temporary game installation and the in-memory registry.

#[path = "../common/mod.rs"]
pub mod common;

pub mod backup_flow;
pub mod restore_flow;
pub mod round_trip;
