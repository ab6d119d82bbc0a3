//! bwsave - Black & White savegame backup and restore
//!
//! This library backs up a single game profile (its profile directory, the
//! creature mind and physique files, and its registry key) into one zip
//! archive, and restores such an archive onto the same or another machine.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Profile reference and archive manifest
//! - `registry`: Registry capability trait with Windows and in-memory backends
//! - `storage`: Atomic JSON and file writes
//! - `locator`: Resolves profiles, directories and registry keys
//! - `backup`: Staged backup and restore pipelines
//! - `i18n`: Localized user-facing messages
//! - `prompt`: Console and scripted question/answer channels
//! - `cli`: Command handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use bwsave::config::{AppPaths, Config};
//!
//! let paths = AppPaths::new()?;
//! let config = Config::load_or_create(&paths)?;
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod i18n;
pub mod locator;
pub mod models;
pub mod prompt;
pub mod registry;
pub mod storage;

pub use error::{SaveError, SaveResult};
