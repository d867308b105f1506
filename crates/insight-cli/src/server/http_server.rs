//! Plain HTTP listener.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::lifecycle::serve_with_shutdown;
use super::shutdown::shutdown_signal;
use super::{ServerError, ServerResult};
use crate::{TRACING_TARGET_SERVER_SHUTDOWN, TRACING_TARGET_SERVER_STARTUP};
use crate::config::ServerConfig;

/// Binds the configured address and serves `app` with graceful shutdown.
///
/// In-flight requests get `shutdown_timeout` to finish once a signal
/// arrives; the server stops regardless after that.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the address cannot
/// be bound, or the server fails while running.
pub async fn serve_http(app: Router, server_config: ServerConfig) -> ServerResult<()> {
    server_config
        .validate()
        .map_err(|err| ServerError::invalid_config(&err))?;

    let server_addr = server_config.server_addr();
    let listener = TcpListener::bind(server_addr).await.map_err(|source| {
        tracing::error!(
            target: TRACING_TARGET_SERVER_STARTUP,
            addr = %server_addr,
            error = %source,
            "Failed to bind to address"
        );

        ServerError::Bind {
            address: server_addr.to_string(),
            source,
        }
    })?;

    let shutdown_timeout = server_config.shutdown_timeout();
    let signalled = Arc::new(Notify::new());
    let notify = Arc::clone(&signalled);
    let graceful = async move {
        shutdown_signal(shutdown_timeout).await;
        notify.notify_one();
    };

    serve_with_shutdown(&server_config, || async move {
        let server = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(graceful)
        .into_future();

        tokio::select! {
            result = server => result,
            () = async {
                signalled.notified().await;
                tokio::time::sleep(shutdown_timeout).await;
            } => {
                tracing::warn!(
                    target: TRACING_TARGET_SERVER_SHUTDOWN,
                    timeout_secs = shutdown_timeout.as_secs(),
                    "Shutdown timeout elapsed, dropping remaining connections"
                );
                Ok(())
            }
        }
    })
    .await
}
