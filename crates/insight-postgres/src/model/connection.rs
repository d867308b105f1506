//! Stored target-database connection record.

use diesel::prelude::*;
use jiff_diesel::Timestamp;

use crate::schema::connections;
use crate::target::TargetParams;

/// A named, stored set of credentials for a target database.
#[derive(Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = connections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Connection {
    /// Unique connection identifier.
    pub id: i32,
    /// Human-readable, unique connection name.
    pub connection_name: String,
    /// Target host name or address.
    pub hostname: String,
    /// Target port.
    pub port: i32,
    /// Target database name.
    pub dbname: String,
    /// Target user name.
    pub username: String,
    /// Target password, never returned by the API.
    pub password: String,
    /// Timestamp when the record was created.
    pub created_at: Timestamp,
    /// Timestamp when the record was last updated.
    pub updated_at: Timestamp,
    /// Whether the record is active.
    pub is_active: bool,
    /// Timestamp of the last successful connectivity check.
    pub last_connected_at: Option<Timestamp>,
}

/// Data for creating a new connection record.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = connections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewConnection {
    pub connection_name: String,
    pub hostname: String,
    pub port: i32,
    pub dbname: String,
    pub username: String,
    pub password: String,
    pub is_active: bool,
}

/// Partial update of a connection record.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = connections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateConnection {
    pub connection_name: Option<String>,
    pub hostname: Option<String>,
    pub port: Option<i32>,
    pub dbname: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub last_connected_at: Option<Option<Timestamp>>,
}

impl Connection {
    /// Returns the stored credentials in the form accepted by the target layer.
    pub fn target_params(&self) -> TargetParams {
        TargetParams {
            name: Some(self.dbname.clone()),
            user: Some(self.username.clone()),
            password: Some(self.password.clone()),
            host: Some(self.hostname.clone()),
            port: u16::try_from(self.port).ok().map(Into::into),
        }
    }

    /// Returns when connectivity was last confirmed.
    pub fn last_connected_at(&self) -> Option<jiff::Timestamp> {
        self.last_connected_at.map(Into::into)
    }
}

impl UpdateConnection {
    /// Returns whether the update would change nothing.
    pub fn is_empty(&self) -> bool {
        self.connection_name.is_none()
            && self.hostname.is_none()
            && self.port.is_none()
            && self.dbname.is_none()
            && self.username.is_none()
            && self.password.is_none()
            && self.is_active.is_none()
            && self.last_connected_at.is_none()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("connection_name", &self.connection_name)
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("username", &self.username)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection() -> Connection {
        let now = Timestamp::from(jiff::Timestamp::UNIX_EPOCH);
        Connection {
            id: 1,
            connection_name: "analytics".to_owned(),
            hostname: "db.internal".to_owned(),
            port: 6543,
            dbname: "warehouse".to_owned(),
            username: "reader".to_owned(),
            password: "hunter2".to_owned(),
            created_at: now,
            updated_at: now,
            is_active: true,
            last_connected_at: None,
        }
    }

    #[test]
    fn debug_output_omits_password() {
        assert!(!format!("{:?}", connection()).contains("hunter2"));
    }

    #[test]
    fn target_params_carry_stored_credentials() {
        let params = connection().target_params();
        assert_eq!(params.name.as_deref(), Some("warehouse"));
        assert_eq!(params.host.as_deref(), Some("db.internal"));
        assert_eq!(params.password.as_deref(), Some("hunter2"));
        assert!(params.port.is_some());
    }

    #[test]
    fn default_update_is_empty() {
        assert!(UpdateConnection::default().is_empty());
        let update = UpdateConnection {
            port: Some(5433),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
