//! Report data shaping: date-window translation, in-memory joins, and
//! spreadsheet serialization. Everything in this module is pure; the
//! queries feeding it live in [`crate::services::reports`].

pub mod date_range;
pub mod rows;
pub mod xlsx;

pub use rows::{JoinOutcome, ReportRow};
