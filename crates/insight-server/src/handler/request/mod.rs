//! Request types for HTTP handlers.

mod connections;
mod generation;
mod paths;
mod queries;

pub use connections::*;
pub use generation::*;
pub use paths::*;
pub use queries::*;
