//! Configuration module for bwsave
//!
//! This module provides configuration management including:
//! - Platform path resolution for bwsave's own files
//! - The immutable game/registry layout configuration

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{Config, GameLayout, RegistryLayout, ValueLocation, WorkspaceLayout};
