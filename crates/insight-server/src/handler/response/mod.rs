//! Response types for HTTP handlers.

mod connections;
mod errors;
mod generation;
mod monitors;
mod queries;

pub use connections::*;
pub use errors::*;
pub use generation::*;
pub use monitors::*;
pub use queries::*;
