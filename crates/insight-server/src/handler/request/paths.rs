use schemars::JsonSchema;
use serde::Deserialize;

/// Path parameters for connection-specific routes.
#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
pub struct ConnectionPathParams {
    /// Connection identifier.
    pub id: i32,
}
