//! Internal error types of the remote runtime client.

use cascade_core::BoxedError;
use thiserror::Error;

/// Errors talking to a remote runtime.
#[derive(Debug, Error)]
pub(crate) enum RemoteError {
    /// Request could not be sent or the runtime answered with an error status.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// The response body is not the expected schema.
    #[error("invalid response: {0}")]
    Serde(#[from] serde_json::Error),

    /// Credentials could not be obtained.
    #[error("could not obtain access token: {0}")]
    Token(#[source] BoxedError),

    /// The configured URL cannot be used.
    #[error("invalid runtime url: {0}")]
    Url(#[from] url::ParseError),
}

impl From<RemoteError> for crate::Error {
    fn from(err: RemoteError) -> Self {
        let message = err.to_string();
        match err {
            RemoteError::Reqwest(e) => {
                let message = if e.is_timeout() {
                    format!("runtime request timed out: {e}")
                } else if e.is_connect() {
                    format!("connection to runtime failed: {e}")
                } else {
                    message
                };
                Self::RuntimeConnection {
                    message,
                    source: Some(Box::new(e)),
                }
            }
            RemoteError::Token(e) => Self::RuntimeConnection {
                message,
                source: Some(e),
            },
            RemoteError::Url(e) => Self::RuntimeConnection {
                message,
                source: Some(Box::new(e)),
            },
            RemoteError::Serde(e) => Self::ResultValidation {
                message,
                source: Some(Box::new(e)),
            },
        }
    }
}
