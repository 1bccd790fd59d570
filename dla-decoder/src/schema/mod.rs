//! CAN schema tables and their JSON loader
//!
//! This module contains the loader for per-subsystem schema files and the
//! ordered schema database used to resolve CAN identifiers.

pub mod database;
pub mod json;

// Re-export key types for convenience
pub use database::{resolve, CanIdentifier, SchemaDatabase, SchemaEntry, SchemaStats, SchemaTable};
pub use json::load_schema_file;
