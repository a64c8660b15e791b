//! Pure calendar logic for the tutorium scheduling engine.
//!
//! Everything in this crate is side-effect free: converting civil wall-clock
//! times to absolute instants, expanding a weekly recurrence rule into dated
//! occurrences, testing instants against free periods, diffing schedule
//! values, and planning the session reconciliation that the service layer
//! applies inside a transaction.

pub mod cal;
pub mod error;
