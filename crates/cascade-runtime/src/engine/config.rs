//! Engine configuration.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Default bound on concurrently running top-level executions.
pub const DEFAULT_MAX_CONCURRENT_EXECUTIONS: usize = 10;

/// Behavior of an [`Engine`](super::Engine).
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(
    name = "EngineConfigBuilder",
    pattern = "owned",
    setter(into, prefix = "with"),
    build_fn(validate = "Self::validate_config")
)]
pub struct EngineConfig {
    /// Run components whose outputs are all plots
    #[builder(default = "false")]
    #[serde(default)]
    pub run_pure_plot_operators: bool,
    /// Maximum number of executions running at the same time
    #[builder(default = "DEFAULT_MAX_CONCURRENT_EXECUTIONS")]
    #[serde(default = "default_max_concurrent_executions")]
    pub max_concurrent_executions: usize,
}

fn default_max_concurrent_executions() -> usize {
    DEFAULT_MAX_CONCURRENT_EXECUTIONS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            run_pure_plot_operators: false,
            max_concurrent_executions: DEFAULT_MAX_CONCURRENT_EXECUTIONS,
        }
    }
}

impl EngineConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

impl EngineConfigBuilder {
    fn validate_config(&self) -> Result<(), String> {
        if self.max_concurrent_executions == Some(0) {
            return Err("Max concurrent executions must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::builder()
            .with_run_pure_plot_operators(true)
            .with_max_concurrent_executions(2usize)
            .build()
            .expect("valid config");

        assert!(config.run_pure_plot_operators);
        assert_eq!(config.max_concurrent_executions, 2);
    }

    #[test]
    fn test_builder_defaults_match_default() {
        assert_eq!(EngineConfig::builder().build().unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = EngineConfig::builder()
            .with_max_concurrent_executions(0usize)
            .build();
        assert!(result.is_err());
    }
}
