//! Core data models for bwsave
//!
//! Typed records for what a backup contains: the profile being saved and the
//! manifest stored alongside it.

pub mod manifest;
pub mod profile;

pub use manifest::Manifest;
pub use profile::ProfileRef;
