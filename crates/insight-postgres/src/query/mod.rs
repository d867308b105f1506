//! Repositories for the application database.
//!
//! Each repository is a trait implemented for [`PgConnection`], so it can be
//! called on any pooled connection:
//!
//! ```ignore
//! let mut conn = pg_client.get_connection().await?;
//! let records = conn.list_connections().await?;
//! ```
//!
//! [`PgConnection`]: crate::PgConnection

mod connection;

pub use connection::ConnectionRepository;
