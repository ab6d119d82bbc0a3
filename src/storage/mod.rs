//! Storage helpers for bwsave
//!
//! JSON files (manifest, in-memory registry exports) and archives are written
//! through a temp file and renamed into place.

pub mod file_io;

pub use file_io::{read_json_required, write_atomic, write_json_atomic};
