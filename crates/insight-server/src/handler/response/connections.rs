use insight_postgres::model;
use jiff::Timestamp;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A stored connection. The password is never returned.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Connection {
    /// Connection identifier.
    pub id: i32,
    /// Unique connection name.
    pub connection_name: String,
    /// Target host.
    pub hostname: String,
    /// Target port.
    pub port: i32,
    /// Target database name.
    pub dbname: String,
    /// Target user name.
    pub username: String,
    /// Whether the connection is active.
    pub is_active: bool,
    /// When the record was created.
    pub created_at: Timestamp,
    /// When the record was last updated.
    pub updated_at: Timestamp,
    /// When connectivity was last confirmed.
    pub last_connected_at: Option<Timestamp>,
}

impl Connection {
    /// Creates the response from the database model.
    pub fn from_model(connection: model::Connection) -> Self {
        Self {
            last_connected_at: connection.last_connected_at(),
            created_at: connection.created_at.into(),
            updated_at: connection.updated_at.into(),
            id: connection.id,
            connection_name: connection.connection_name,
            hostname: connection.hostname,
            port: connection.port,
            dbname: connection.dbname,
            username: connection.username,
            is_active: connection.is_active,
        }
    }
}

/// All stored connections, newest first.
pub type Connections = Vec<Connection>;

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> model::Connection {
        model::Connection {
            id: 7,
            connection_name: "analytics".to_owned(),
            hostname: "db.example.com".to_owned(),
            port: 25060,
            dbname: "defaultdb".to_owned(),
            username: "avnadmin".to_owned(),
            password: "hunter2".to_owned(),
            created_at: Timestamp::UNIX_EPOCH.into(),
            updated_at: Timestamp::UNIX_EPOCH.into(),
            is_active: true,
            last_connected_at: None,
        }
    }

    #[test]
    fn serialized_connection_has_no_password() -> serde_json::Result<()> {
        let value = serde_json::to_value(Connection::from_model(model()))?;
        let object = value.as_object().expect("connection serializes as an object");

        assert!(!object.contains_key("password"));
        assert!(!value.to_string().contains("hunter2"));
        assert_eq!(object["dbname"], "defaultdb");
        assert_eq!(object["port"], 25060);
        assert!(object["last_connected_at"].is_null());
        Ok(())
    }
}
