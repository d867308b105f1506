//! Access to caller-described target databases.
//!
//! Every operation opens exactly one connection through a [`TargetConnection`]
//! guard and releases it on every exit path. Target databases are never
//! pooled: each request brings its own parameters, resolved by
//! [`TargetConfig::resolve`].

mod config;
mod connection;
mod error;
mod execute;
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
mod mock;
mod probe;
mod service;
mod tls;

pub use config::{DEFAULT_TARGET_PORT, TargetConfig, TargetDefaults, TargetParams, TargetPort};
pub use connection::TargetConnection;
pub use error::{TargetError, TargetResult};
pub use execute::{QueryResult, Row, StatementKind};
#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockTarget;
pub use probe::{ColumnDescriptor, ColumnRow, SchemaDescription, TableColumns};
pub use service::{PostgresTarget, TargetDatabase, TargetService};
pub use tls::{TargetSslMode, TargetTls};
