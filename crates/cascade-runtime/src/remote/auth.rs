//! Credentials for remote runtime calls.

use cascade_core::BoxedError;

/// Yields short-lived credentials before each remote call.
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a bearer token, or `None` to send the request unauthenticated.
    async fn token(&self) -> Result<Option<String>, BoxedError>;
}

/// Sends requests without credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

#[async_trait::async_trait]
impl TokenProvider for NoAuth {
    async fn token(&self) -> Result<Option<String>, BoxedError> {
        Ok(None)
    }
}

/// Sends the same token with every request.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StaticToken").field(&"***").finish()
    }
}

#[async_trait::async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<Option<String>, BoxedError> {
        Ok(Some(self.0.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_providers() {
        assert_eq!(NoAuth.token().await.unwrap(), None);
        assert_eq!(
            StaticToken::new("secret").token().await.unwrap().as_deref(),
            Some("secret")
        );
    }

    #[test]
    fn test_static_token_debug_is_redacted() {
        assert!(!format!("{:?}", StaticToken::new("secret")).contains("secret"));
    }
}
