use std::fmt;
use std::future::Future;
use std::time::Instant;

use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};

use super::{TargetConfig, TargetError, TargetResult, TargetTls};
use crate::TRACING_TARGET_TARGET;

/// Exclusively owned connection to a target database.
///
/// The driver half of the connection runs on a spawned task. Dropping the
/// guard drops the client and aborts that task, so the session is released
/// on every exit path, including early returns and cancelled requests.
pub struct TargetConnection {
    client: Client,
    driver: JoinHandle<()>,
}

impl TargetConnection {
    /// Opens a connection to the target database.
    ///
    /// TLS is negotiated as `tls` describes; without a connector the
    /// session is plain TCP.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError::Connection`] with the driver's message when the
    /// session cannot be established.
    #[tracing::instrument(
        skip_all,
        target = TRACING_TARGET_TARGET,
        fields(database = %config, ssl_mode = %tls.mode())
    )]
    pub async fn connect(config: &TargetConfig, tls: &TargetTls) -> TargetResult<Self> {
        let start = Instant::now();
        let mut pg_config = config.pg_config();
        pg_config.ssl_mode(tls.mode().driver_mode());

        let connected = match tls.connector() {
            Some(connector) => pg_config
                .connect(connector.clone())
                .await
                .map(|(client, connection)| (client, spawn_driver(connection))),
            None => pg_config
                .connect(NoTls)
                .await
                .map(|(client, connection)| (client, spawn_driver(connection))),
        };

        let (client, driver) = connected.map_err(|e| {
            tracing::warn!(
                target: TRACING_TARGET_TARGET,
                error = %e,
                elapsed_ms = start.elapsed().as_millis(),
                "Failed to connect to target database"
            );
            TargetError::connection(&e)
        })?;

        tracing::debug!(
            target: TRACING_TARGET_TARGET,
            elapsed_ms = start.elapsed().as_millis(),
            "Connected to target database"
        );

        Ok(Self { client, driver })
    }

    /// Returns the underlying client.
    #[inline]
    pub fn client(&self) -> &Client {
        &self.client
    }

    #[inline]
    pub(crate) fn client_mut(&mut self) -> &mut Client {
        &mut self.client
    }
}

/// Runs the connection's driver half until the session ends.
fn spawn_driver<F>(connection: F) -> JoinHandle<()>
where
    F: Future<Output = Result<(), tokio_postgres::Error>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::warn!(
                target: TRACING_TARGET_TARGET,
                error = %e,
                "Target connection terminated with an error"
            );
        }
    })
}

impl Drop for TargetConnection {
    fn drop(&mut self) {
        self.driver.abort();
        tracing::trace!(target: TRACING_TARGET_TARGET, "Target connection released");
    }
}

impl fmt::Debug for TargetConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConnection")
            .field("closed", &self.client.is_closed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::target::{TargetDefaults, TargetParams, TargetPort, TargetSslMode};

    #[tokio::test]
    async fn unreachable_target_is_a_connection_error() -> TargetResult<()> {
        let params = TargetParams {
            name: Some("querydb".to_owned()),
            user: Some("user".to_owned()),
            password: Some("password".to_owned()),
            host: Some("127.0.0.1".to_owned()),
            port: Some(TargetPort::Number(1)),
        };

        let mut config = TargetConfig::resolve(Some(&params), &TargetDefaults::default())?;
        config.connect_timeout = Some(Duration::from_secs(2));

        let result = TargetConnection::connect(&config, &TargetTls::disabled()).await;
        assert!(matches!(result, Err(TargetError::Connection(_))));
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_target_fails_the_same_way_over_tls() -> TargetResult<()> {
        let params = TargetParams {
            name: Some("querydb".to_owned()),
            user: Some("user".to_owned()),
            password: Some("password".to_owned()),
            host: Some("127.0.0.1".to_owned()),
            port: Some(TargetPort::Number(1)),
        };

        let defaults = TargetDefaults {
            target_ssl_mode: TargetSslMode::Require,
            ..TargetDefaults::default()
        };
        let mut config = TargetConfig::resolve(Some(&params), &defaults)?;
        config.connect_timeout = Some(Duration::from_secs(2));

        let tls = TargetTls::from_defaults(&defaults)?;
        let result = TargetConnection::connect(&config, &tls).await;
        assert!(matches!(result, Err(TargetError::Connection(_))));
        Ok(())
    }
}
