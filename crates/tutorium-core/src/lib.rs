//! Shared foundation for the tutorium scheduling engine: error taxonomy,
//! configuration loading, and database-independent domain types.

pub mod config;
pub mod error;
pub mod types;
