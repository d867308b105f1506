//! Request extractors that reject with the API's `{"error": ...}` body.
//!
//! - [`Json`] - JSON deserialization with readable rejection messages
//! - [`ValidateJson`] - JSON extraction followed by `validator` checks
//! - [`Path`] - path parameter extraction

pub mod reject;

pub use crate::extract::reject::{Json, Path, ValidateJson};
