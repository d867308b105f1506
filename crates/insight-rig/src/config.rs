//! Configuration for the LLM collaborator.

use std::fmt;

#[cfg(feature = "config")]
use clap::Args;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Default values for configuration options.
mod defaults {
    /// Default Groq chat model.
    pub const GROQ_MODEL: &str = "llama-3.3-70b-versatile";
}

/// LLM provider configuration.
#[derive(Clone, Serialize, Deserialize, Builder)]
#[cfg_attr(feature = "config", derive(Args))]
#[builder(
    pattern = "owned",
    setter(into, strip_option, prefix = "with"),
    build_fn(validate = "Self::validate")
)]
pub struct RigConfig {
    /// Groq API key
    #[cfg_attr(
        feature = "config",
        arg(long = "groq-api-key", env = "GROQ_API_KEY", hide_env_values = true)
    )]
    pub groq_api_key: String,

    /// Groq chat model
    #[cfg_attr(
        feature = "config",
        arg(long = "groq-model", env = "GROQ_MODEL", default_value = defaults::GROQ_MODEL)
    )]
    #[builder(default = "defaults::GROQ_MODEL.to_owned()")]
    pub groq_model: String,

    /// Sampling temperature (optional, provider default when unset)
    #[cfg_attr(
        feature = "config",
        arg(long = "llm-temperature", env = "LLM_TEMPERATURE")
    )]
    #[builder(default)]
    pub llm_temperature: Option<f64>,
}

impl RigConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> RigConfigBuilder {
        RigConfigBuilder::default()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> crate::Result<()> {
        check(
            Some(&self.groq_api_key),
            Some(&self.groq_model),
            Some(self.llm_temperature),
        )
        .map_err(crate::Error::config)
    }
}

impl RigConfigBuilder {
    fn validate(builder: &RigConfigBuilder) -> Result<(), String> {
        check(
            builder.groq_api_key.as_ref(),
            builder.groq_model.as_ref(),
            builder.llm_temperature,
        )
    }
}

fn check(
    api_key: Option<&String>,
    model: Option<&String>,
    temperature: Option<Option<f64>>,
) -> Result<(), String> {
    if api_key.is_some_and(|key| key.trim().is_empty()) {
        return Err("Groq API key cannot be empty".to_owned());
    }

    if model.is_some_and(|model| model.trim().is_empty()) {
        return Err("Groq model cannot be empty".to_owned());
    }

    if let Some(Some(temperature)) = temperature
        && !(0.0..=2.0).contains(&temperature)
    {
        return Err("LLM temperature must be between 0.0 and 2.0".to_owned());
    }

    Ok(())
}

impl fmt::Debug for RigConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RigConfig")
            .field("groq_api_key", &"***")
            .field("groq_model", &self.groq_model)
            .field("llm_temperature", &self.llm_temperature)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_applies_defaults() {
        let config = RigConfig::builder()
            .with_groq_api_key("gsk_test")
            .build()
            .expect("valid config");

        assert_eq!(config.groq_model, "llama-3.3-70b-versatile");
        assert_eq!(config.llm_temperature, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_rejects_invalid_values() {
        assert!(RigConfig::builder().with_groq_api_key("  ").build().is_err());
        assert!(RigConfig::builder().build().is_err());
        assert!(
            RigConfig::builder()
                .with_groq_api_key("gsk_test")
                .with_llm_temperature(3.5)
                .build()
                .is_err()
        );
    }

    #[test]
    fn debug_output_hides_api_key() {
        let config = RigConfig::builder()
            .with_groq_api_key("gsk_secret")
            .build()
            .expect("valid config");

        assert!(!format!("{config:?}").contains("gsk_secret"));
    }
}
