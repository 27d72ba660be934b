//! Remote runtime configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Default timeout for runtime requests in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings of a remote runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct RemoteRuntimeConfig {
    /// Base URL of the remote runtime; executions run in process when unset
    #[cfg_attr(feature = "config", arg(long = "runtime-url", env = "RUNTIME_URL"))]
    #[serde(default)]
    pub runtime_url: Option<String>,

    /// Request timeout in seconds (0 uses the default)
    #[cfg_attr(
        feature = "config",
        arg(long = "runtime-timeout", env = "RUNTIME_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)
    )]
    #[serde(default = "default_timeout")]
    pub runtime_timeout: u64,

    /// User-Agent header sent to the runtime
    #[cfg_attr(feature = "config", arg(long = "runtime-user-agent", env = "RUNTIME_USER_AGENT"))]
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for RemoteRuntimeConfig {
    fn default() -> Self {
        Self {
            runtime_url: None,
            runtime_timeout: DEFAULT_TIMEOUT_SECS,
            user_agent: None,
        }
    }
}

impl RemoteRuntimeConfig {
    /// Sets the runtime URL.
    #[must_use]
    pub fn with_runtime_url(mut self, url: impl Into<String>) -> Self {
        self.runtime_url = Some(url.into());
        self
    }

    /// Sets the timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.runtime_timeout = seconds;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Returns true if a runtime URL is configured.
    pub fn is_remote(&self) -> bool {
        self.runtime_url.is_some()
    }

    /// Returns the effective timeout, using the default if zero.
    pub fn effective_timeout(&self) -> Duration {
        match self.runtime_timeout {
            0 => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            seconds => Duration::from_secs(seconds),
        }
    }

    /// Returns the effective user agent, using the default if unset or empty.
    pub fn effective_user_agent(&self) -> String {
        match self.user_agent.as_deref() {
            Some(user_agent) if !user_agent.is_empty() => user_agent.to_owned(),
            _ => format!("cascade/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}
