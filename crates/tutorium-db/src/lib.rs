//! Postgres persistence layer for the tutorium scheduling engine.

use diesel_migrations::{EmbeddedMigrations, embed_migrations};

pub mod db;
pub mod error;
pub mod model;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();
