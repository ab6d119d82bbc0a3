//! Shared test utilities for bwsave
//!
//! - `machine`: a throwaway game installation with an in-memory registry

pub mod machine;
