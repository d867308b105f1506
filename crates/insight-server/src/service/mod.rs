//! Application state and dependency injection.

mod config;

use insight_postgres::PgClient;
use insight_postgres::target::{TargetDefaults, TargetService};
use insight_rig::CompletionService;

pub use crate::service::config::ServiceConfig;
pub use crate::{Error, Result};

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Debug, Clone)]
pub struct ServiceState {
    // External services:
    pub postgres: PgClient,
    pub target: TargetService,
    pub completion: CompletionService,

    // Configuration:
    pub target_defaults: TargetDefaults,
}

impl ServiceState {
    /// Assembles state from already constructed services.
    pub fn new(
        postgres: PgClient,
        target: TargetService,
        completion: CompletionService,
        target_defaults: TargetDefaults,
    ) -> Self {
        Self {
            postgres,
            target,
            completion,
            target_defaults,
        }
    }

    /// Initializes application state from configuration.
    ///
    /// Connects to the application database, applies pending migrations and
    /// builds the LLM provider.
    pub async fn from_config(service_config: &ServiceConfig) -> Result<Self> {
        service_config.validate()?;

        let service_state = Self {
            postgres: service_config.connect_postgres().await?,
            target: service_config.create_target()?,
            completion: service_config.create_completion()?,

            target_defaults: service_config.target.clone(),
        };

        Ok(service_state)
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

// External services:
impl_di!(postgres: PgClient);
impl_di!(target: TargetService);
impl_di!(completion: CompletionService);

// Configuration:
impl_di!(target_defaults: TargetDefaults);
