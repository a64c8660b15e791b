//! Orchestration layer of the tutorium scheduling engine.
//!
//! Exposes the operations the resource layer consumes: schedule and session
//! lifecycle, free periods, and course-wide configuration changes. Every
//! write path runs in a single transaction per request and locks the
//! tutorial-group rows it reconciles, so a reconciliation run is atomic and
//! concurrent runs against the same group are serialized.

pub mod configuration;
pub mod engine;
pub mod error;
pub mod free_period;
pub mod observer;
pub mod schedule;
pub mod session;
