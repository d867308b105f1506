//! Resolution of per-request target connection parameters.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use super::{TargetError, TargetResult, TargetSslMode};

/// Port used when a request omits one.
pub const DEFAULT_TARGET_PORT: u16 = 5432;

/// Target connection parameters as supplied by an API caller.
///
/// All fields are optional on the wire so that an incomplete object can be
/// reported as a configuration error rather than a deserialization failure.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct TargetParams {
    /// Database name.
    #[serde(default)]
    pub name: Option<String>,
    /// User name.
    #[serde(default)]
    pub user: Option<String>,
    /// Password.
    #[serde(default)]
    pub password: Option<String>,
    /// Host name or address.
    #[serde(default)]
    pub host: Option<String>,
    /// Port, as a number or a numeric string. Defaults to 5432.
    #[serde(default)]
    pub port: Option<TargetPort>,
}

/// A port given either as a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(untagged)]
pub enum TargetPort {
    Number(i64),
    Text(String),
}

impl From<u16> for TargetPort {
    fn from(port: u16) -> Self {
        Self::Number(port.into())
    }
}

impl TargetPort {
    /// Returns the port, `None` for an empty string.
    fn resolve(&self) -> TargetResult<Option<u16>> {
        let port = match self {
            Self::Number(number) => *number,
            Self::Text(text) if text.trim().is_empty() => return Ok(None),
            Self::Text(text) => text
                .trim()
                .parse::<i64>()
                .map_err(|_| TargetError::config(format!("Invalid port: {text}")))?,
        };

        match u16::try_from(port) {
            Ok(port) if port > 0 => Ok(Some(port)),
            _ => Err(TargetError::config(format!(
                "Invalid port: {port} (expected 1-65535)"
            ))),
        }
    }
}

impl fmt::Debug for TargetParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetParams")
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

/// Target database used when a request carries no parameters at all.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct TargetDefaults {
    /// Default target database name
    #[cfg_attr(
        feature = "config",
        arg(long = "target-db-name", env = "TARGET_DB_NAME", default_value = "querydb")
    )]
    pub target_db_name: String,

    /// Default target user name
    #[cfg_attr(
        feature = "config",
        arg(long = "target-db-user", env = "TARGET_DB_USER", default_value = "user")
    )]
    pub target_db_user: String,

    /// Default target password
    #[cfg_attr(
        feature = "config",
        arg(
            long = "target-db-password",
            env = "TARGET_DB_PASSWORD",
            default_value = "password",
            hide_env_values = true
        )
    )]
    pub target_db_password: String,

    /// Default target host
    #[cfg_attr(
        feature = "config",
        arg(long = "target-db-host", env = "TARGET_DB_HOST", default_value = "querydb")
    )]
    pub target_db_host: String,

    /// Default target port
    #[cfg_attr(
        feature = "config",
        arg(long = "target-db-port", env = "TARGET_DB_PORT", default_value_t = DEFAULT_TARGET_PORT)
    )]
    pub target_db_port: u16,

    /// Connect timeout for target databases in seconds (optional)
    #[cfg_attr(
        feature = "config",
        arg(long = "target-connect-timeout-secs", env = "TARGET_CONNECT_TIMEOUT_SECS")
    )]
    pub target_connect_timeout_secs: Option<u64>,

    /// TLS mode for target connections: disable, prefer, require or verify-full
    #[cfg_attr(
        feature = "config",
        arg(long = "target-ssl-mode", env = "TARGET_SSL_MODE", value_enum, default_value_t)
    )]
    #[serde(default)]
    pub target_ssl_mode: TargetSslMode,

    /// Extra PEM root certificates trusted in verify-full mode (optional)
    #[cfg_attr(
        feature = "config",
        arg(long = "target-ssl-root-cert", env = "TARGET_SSL_ROOT_CERT")
    )]
    #[serde(default)]
    pub target_ssl_root_cert: Option<PathBuf>,
}

impl Default for TargetDefaults {
    fn default() -> Self {
        Self {
            target_db_name: "querydb".to_owned(),
            target_db_user: "user".to_owned(),
            target_db_password: "password".to_owned(),
            target_db_host: "querydb".to_owned(),
            target_db_port: DEFAULT_TARGET_PORT,
            target_connect_timeout_secs: None,
            target_ssl_mode: TargetSslMode::default(),
            target_ssl_root_cert: None,
        }
    }
}

impl TargetDefaults {
    /// Returns the connect timeout as a Duration.
    #[inline]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.target_connect_timeout_secs.map(Duration::from_secs)
    }

    /// Validates the defaults.
    pub fn validate(&self) -> TargetResult<()> {
        if self.target_db_port == 0 {
            return Err(TargetError::config("target_db_port must be between 1 and 65535"));
        }

        if self.target_connect_timeout_secs == Some(0) {
            return Err(TargetError::config(
                "target_connect_timeout_secs must be greater than zero",
            ));
        }

        if self.target_ssl_root_cert.is_some()
            && self.target_ssl_mode != TargetSslMode::VerifyFull
        {
            return Err(TargetError::config(
                "target_ssl_root_cert is only used with target_ssl_mode verify-full",
            ));
        }

        Ok(())
    }
}

impl fmt::Debug for TargetDefaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetDefaults")
            .field("target_db_name", &self.target_db_name)
            .field("target_db_user", &self.target_db_user)
            .field("target_db_host", &self.target_db_host)
            .field("target_db_port", &self.target_db_port)
            .field(
                "target_connect_timeout_secs",
                &self.target_connect_timeout_secs,
            )
            .field("target_ssl_mode", &self.target_ssl_mode)
            .field("target_ssl_root_cert", &self.target_ssl_root_cert)
            .finish_non_exhaustive()
    }
}

/// Fully resolved parameters for one target connection.
#[derive(Clone, PartialEq, Eq)]
pub struct TargetConfig {
    pub dbname: String,
    pub user: String,
    password: String,
    pub host: String,
    pub port: u16,
    pub connect_timeout: Option<Duration>,
}

impl TargetConfig {
    /// Resolves request parameters against the configured defaults.
    ///
    /// Without parameters the defaults are used as a whole. With parameters,
    /// `name`, `user`, `password` and `host` must all be present and
    /// non-blank; the port falls back to [`DEFAULT_TARGET_PORT`]. Nothing is
    /// merged field by field.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError::Config`] naming the missing fields, or
    /// describing an invalid port.
    pub fn resolve(
        supplied: Option<&TargetParams>,
        defaults: &TargetDefaults,
    ) -> TargetResult<Self> {
        let Some(params) = supplied else {
            return Ok(Self::from_defaults(defaults));
        };

        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|value| !value.trim().is_empty())
        }

        let fields = [
            ("name", present(&params.name)),
            ("user", present(&params.user)),
            ("password", present(&params.password)),
            ("host", present(&params.host)),
        ];

        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(field, _)| *field)
            .collect();

        let [Some(dbname), Some(user), Some(password), Some(host)] = fields.map(|(_, v)| v) else {
            return Err(TargetError::config(format!(
                "Incomplete database configuration, missing: {}",
                missing.join(", ")
            )));
        };

        let port = match &params.port {
            Some(port) => port.resolve()?.unwrap_or(DEFAULT_TARGET_PORT),
            None => DEFAULT_TARGET_PORT,
        };

        Ok(Self {
            dbname: dbname.to_owned(),
            user: user.to_owned(),
            password: password.to_owned(),
            host: host.trim().to_owned(),
            port,
            connect_timeout: defaults.connect_timeout(),
        })
    }

    /// Uses the configured defaults as a whole.
    pub fn from_defaults(defaults: &TargetDefaults) -> Self {
        Self {
            dbname: defaults.target_db_name.clone(),
            user: defaults.target_db_user.clone(),
            password: defaults.target_db_password.clone(),
            host: defaults.target_db_host.clone(),
            port: defaults.target_db_port,
            connect_timeout: defaults.connect_timeout(),
        }
    }

    /// Returns the password.
    #[inline]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Builds the driver configuration.
    pub(crate) fn pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .dbname(&self.dbname)
            .user(&self.user)
            .password(&self.password)
            .host(&self.host)
            .port(self.port)
            .application_name("insight");

        if let Some(timeout) = self.connect_timeout {
            config.connect_timeout(timeout);
        }

        config
    }
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"***")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl fmt::Display for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}/{}", self.user, self.host, self.port, self.dbname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TargetParams {
        TargetParams {
            name: Some("warehouse".to_owned()),
            user: Some("reader".to_owned()),
            password: Some("hunter2".to_owned()),
            host: Some("db.internal".to_owned()),
            port: None,
        }
    }

    #[test]
    fn absent_params_use_defaults() -> TargetResult<()> {
        let config = TargetConfig::resolve(None, &TargetDefaults::default())?;
        assert_eq!(config.dbname, "querydb");
        assert_eq!(config.user, "user");
        assert_eq!(config.password(), "password");
        assert_eq!(config.host, "querydb");
        assert_eq!(config.port, 5432);
        Ok(())
    }

    #[test]
    fn supplied_params_replace_defaults() -> TargetResult<()> {
        let params = TargetParams {
            port: Some(TargetPort::Text("6543".to_owned())),
            ..params()
        };

        let config = TargetConfig::resolve(Some(&params), &TargetDefaults::default())?;
        assert_eq!(config.dbname, "warehouse");
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 6543);
        Ok(())
    }

    #[test]
    fn missing_port_falls_back() -> TargetResult<()> {
        let config = TargetConfig::resolve(Some(&params()), &TargetDefaults::default())?;
        assert_eq!(config.port, DEFAULT_TARGET_PORT);

        let params = TargetParams {
            port: Some(TargetPort::Text(String::new())),
            ..params()
        };
        let config = TargetConfig::resolve(Some(&params), &TargetDefaults::default())?;
        assert_eq!(config.port, DEFAULT_TARGET_PORT);
        Ok(())
    }

    #[test]
    fn incomplete_params_name_missing_fields() {
        let params = TargetParams {
            name: Some("warehouse".to_owned()),
            user: Some("   ".to_owned()),
            ..Default::default()
        };

        let error = TargetConfig::resolve(Some(&params), &TargetDefaults::default())
            .expect_err("incomplete config must be rejected");
        let TargetError::Config(message) = error else {
            panic!("expected a configuration error");
        };
        assert!(message.contains("user, password, host"));
        assert!(!message.contains("name"));
    }

    #[test]
    fn empty_object_is_incomplete() {
        let result = TargetConfig::resolve(Some(&TargetParams::default()), &TargetDefaults::default());
        assert!(matches!(result, Err(TargetError::Config(_))));
    }

    #[test]
    fn invalid_ports_are_rejected() {
        for port in [
            TargetPort::Number(0),
            TargetPort::Number(70000),
            TargetPort::Number(-1),
            TargetPort::Text("postgres".to_owned()),
        ] {
            let params = TargetParams {
                port: Some(port),
                ..params()
            };
            let result = TargetConfig::resolve(Some(&params), &TargetDefaults::default());
            assert!(matches!(result, Err(TargetError::Config(_))));
        }
    }

    #[test]
    fn port_accepts_number_or_string_on_the_wire() -> serde_json::Result<()> {
        let params: TargetParams = serde_json::from_str(
            r#"{"name":"a","user":"b","password":"c","host":"d","port":5433}"#,
        )?;
        assert_eq!(params.port, Some(TargetPort::Number(5433)));

        let params: TargetParams = serde_json::from_str(r#"{"port":"5433"}"#)?;
        assert_eq!(params.port, Some(TargetPort::Text("5433".to_owned())));
        Ok(())
    }

    #[test]
    fn debug_output_masks_passwords() -> TargetResult<()> {
        let config = TargetConfig::resolve(Some(&params()), &TargetDefaults::default())?;
        assert!(!format!("{config:?}").contains("hunter2"));
        assert!(!format!("{:?}", params()).contains("hunter2"));
        assert!(!format!("{:?}", TargetDefaults::default()).contains("password\""));
        assert_eq!(config.to_string(), "reader@db.internal:5432/warehouse");
        Ok(())
    }

    #[test]
    fn root_certificate_requires_verify_full() {
        let mut defaults = TargetDefaults {
            target_ssl_root_cert: Some(PathBuf::from("/etc/insight/ca.pem")),
            ..TargetDefaults::default()
        };
        assert!(matches!(defaults.validate(), Err(TargetError::Config(_))));

        defaults.target_ssl_mode = TargetSslMode::VerifyFull;
        assert!(defaults.validate().is_ok());
    }
}
