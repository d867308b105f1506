//! [`Error`], [`ErrorKind`] and [`Result`].
//!
//! Library errors are translated into HTTP errors here, through `From`
//! implementations, and nowhere else.

mod http_error;
mod pg_error;
mod rig_error;
mod target_error;

pub use http_error::{Error, ErrorKind, Result};
pub(crate) use target_error::generation_error;
