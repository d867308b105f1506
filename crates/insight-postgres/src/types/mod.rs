//! Supporting types shared by models, queries and their callers.

mod constraint;

pub use constraint::{ConnectionConstraints, ConstraintCategory, ConstraintViolation};
