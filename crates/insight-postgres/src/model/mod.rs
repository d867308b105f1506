//! Database models for the application database.

mod connection;

pub use connection::{Connection, NewConnection, UpdateConnection};
