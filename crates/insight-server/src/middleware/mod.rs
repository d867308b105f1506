//! Middleware for `axum::Router` and HTTP request processing.
//!
//! - Security (CORS, headers, body limits, compression)
//! - Observability (request IDs, tracing spans)
//! - Recovery (panics, timeouts, service errors)
//! - OpenAPI documentation
//!
//! ```rust,no_run
//! use axum::Router;
//! use insight_server::middleware::{
//!     RouterObservabilityExt, RouterRecoveryExt, RouterSecurityExt,
//! };
//!
//! let app = Router::<()>::new()
//!     .with_default_security()
//!     .with_observability()
//!     .with_default_recovery();
//! ```

mod observability;
mod recovery;
mod security;
mod specification;

pub use observability::RouterObservabilityExt;
pub use recovery::{RecoveryConfig, RouterRecoveryExt};
pub use security::{
    CorsConfig, DEFAULT_MAX_BODY_SIZE, FrameOptions, ReferrerPolicy, RouterSecurityExt,
    SecurityHeadersConfig,
};
pub use specification::{OpenApiConfig, RouterOpenApiExt};
