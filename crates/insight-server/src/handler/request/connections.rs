use insight_postgres::model;
use insight_postgres::target::DEFAULT_TARGET_PORT;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request payload for creating a stored connection.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct CreateConnection {
    /// Unique connection name.
    #[validate(length(min = 1, max = 255))]
    pub connection_name: String,
    /// Target host.
    #[validate(length(min = 1, max = 255))]
    pub hostname: String,
    /// Target port, 5432 when omitted.
    #[validate(range(min = 1, max = 65535))]
    pub port: Option<i32>,
    /// Target database name.
    #[validate(length(min = 1, max = 255))]
    pub dbname: String,
    /// Target user name.
    #[validate(length(min = 1, max = 255))]
    pub username: String,
    /// Target password. Write-only.
    #[validate(length(min = 1, max = 255))]
    pub password: String,
    /// Whether the connection is active, true when omitted.
    pub is_active: Option<bool>,
}

impl CreateConnection {
    /// Converts the request into a database model.
    pub fn into_model(self) -> model::NewConnection {
        model::NewConnection {
            connection_name: self.connection_name,
            hostname: self.hostname,
            port: self.port.unwrap_or(i32::from(DEFAULT_TARGET_PORT)),
            dbname: self.dbname,
            username: self.username,
            password: self.password,
            is_active: self.is_active.unwrap_or(true),
        }
    }
}

/// Request payload for updating a stored connection.
///
/// Serves both `PUT` and `PATCH`; absent fields are left untouched.
#[must_use]
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, Validate)]
pub struct UpdateConnection {
    /// New connection name.
    #[validate(length(min = 1, max = 255))]
    pub connection_name: Option<String>,
    /// New target host.
    #[validate(length(min = 1, max = 255))]
    pub hostname: Option<String>,
    /// New target port.
    #[validate(range(min = 1, max = 65535))]
    pub port: Option<i32>,
    /// New target database name.
    #[validate(length(min = 1, max = 255))]
    pub dbname: Option<String>,
    /// New target user name.
    #[validate(length(min = 1, max = 255))]
    pub username: Option<String>,
    /// New target password.
    #[validate(length(min = 1, max = 255))]
    pub password: Option<String>,
    /// New active flag.
    pub is_active: Option<bool>,
}

impl UpdateConnection {
    /// Converts the request into a database changeset.
    pub fn into_model(self) -> model::UpdateConnection {
        model::UpdateConnection {
            connection_name: self.connection_name,
            hostname: self.hostname,
            port: self.port,
            dbname: self.dbname,
            username: self.username,
            password: self.password,
            is_active: self.is_active,
            last_connected_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request() -> CreateConnection {
        CreateConnection {
            connection_name: "defaultdb".to_owned(),
            hostname: "db.example.com".to_owned(),
            port: None,
            dbname: "defaultdb".to_owned(),
            username: "avnadmin".to_owned(),
            password: "secret".to_owned(),
            is_active: None,
        }
    }

    #[test]
    fn create_defaults_port_and_active_flag() {
        let model = create_request().into_model();
        assert_eq!(model.port, 5432);
        assert!(model.is_active);
    }

    #[test]
    fn create_rejects_empty_name_and_bad_port() {
        let request = CreateConnection {
            connection_name: String::new(),
            port: Some(70000),
            ..create_request()
        };

        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("connection_name"));
        assert!(fields.contains_key("port"));
    }

    #[test]
    fn empty_update_is_valid_and_empty() {
        let update = UpdateConnection::default();
        assert!(update.validate().is_ok());
        assert!(update.into_model().is_empty());
    }
}
