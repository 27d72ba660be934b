//! HTTP client of a remote runtime.

use std::sync::Arc;

use reqwest::{Client, RequestBuilder};
use url::Url;

use super::error::RemoteError;
use super::{RemoteRuntimeConfig, TokenProvider, TRACING_TARGET};
use crate::error::{Error, Result};
use crate::payload::{ExecutionInput, ExecutionResult, RuntimeInfo};

struct RemoteRuntimeClientInner {
    http: Client,
    base_url: Url,
    config: RemoteRuntimeConfig,
    tokens: Arc<dyn TokenProvider>,
}

/// Posts execution inputs to a remote runtime.
///
/// Cheap to clone. Credentials are requested from the [`TokenProvider`]
/// before every call.
#[derive(Clone)]
pub struct RemoteRuntimeClient {
    inner: Arc<RemoteRuntimeClientInner>,
}

impl std::fmt::Debug for RemoteRuntimeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteRuntimeClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl RemoteRuntimeClient {
    /// Creates a client for the runtime at `config.runtime_url`.
    pub fn new(config: RemoteRuntimeConfig, tokens: impl TokenProvider + 'static) -> Result<Self> {
        let Some(runtime_url) = config.runtime_url.as_deref() else {
            return Err(Error::connection("no runtime url configured"));
        };

        // Base URLs without a trailing slash would lose their last segment on join.
        let mut base_url = Url::parse(runtime_url).map_err(RemoteError::from)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let timeout = config.effective_timeout();
        tracing::debug!(
            target: TRACING_TARGET,
            base_url = %base_url,
            timeout_ms = timeout.as_millis(),
            "Creating remote runtime client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(config.effective_user_agent())
            .build()
            .map_err(RemoteError::from)?;

        tracing::info!(
            target: TRACING_TARGET,
            base_url = %base_url,
            "Remote runtime client created"
        );

        Ok(Self {
            inner: Arc::new(RemoteRuntimeClientInner {
                http,
                base_url,
                config,
                tokens: Arc::new(tokens),
            }),
        })
    }

    pub fn config(&self) -> &RemoteRuntimeConfig {
        &self.inner.config
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Runs `input` on the remote runtime.
    ///
    /// Credential and transport failures, including error statuses, are
    /// connection errors. A body that is not an [`ExecutionResult`] is a
    /// result validation error.
    pub async fn run(&self, input: &ExecutionInput) -> Result<ExecutionResult> {
        let url = self.endpoint("runtime")?;
        tracing::debug!(
            target: TRACING_TARGET,
            url = %url,
            job_id = %input.job_id,
            "Posting execution input"
        );

        let request = self.authorize(self.inner.http.post(url).json(input)).await?;
        let response = request
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(RemoteError::from)?;
        let body = response.bytes().await.map_err(RemoteError::from)?;

        let result: ExecutionResult = serde_json::from_slice(&body).map_err(RemoteError::from)?;
        if result.job_id != input.job_id {
            return Err(Error::result_validation(format!(
                "runtime answered for job {} instead of {}",
                result.job_id, input.job_id
            )));
        }

        Ok(result)
    }

    /// Returns the version information of the remote runtime.
    pub async fn info(&self) -> Result<RuntimeInfo> {
        let url = self.endpoint("info")?;
        let request = self.authorize(self.inner.http.get(url)).await?;
        let response = request
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(RemoteError::from)?;
        let body = response.bytes().await.map_err(RemoteError::from)?;

        Ok(serde_json::from_slice(&body).map_err(RemoteError::from)?)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.inner.base_url.join(path).map_err(RemoteError::from)?)
    }

    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.inner.tokens.token().await.map_err(RemoteError::Token)?;
        Ok(match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use cascade_core::BoxedError;

    use axum::http::{header, HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;
    use crate::fixtures;
    use crate::payload::runtime_info;
    use crate::remote::{NoAuth, StaticToken, TokenProvider};

    struct ExpiredCredentials;

    #[async_trait::async_trait]
    impl TokenProvider for ExpiredCredentials {
        async fn token(&self) -> Result<Option<String>, BoxedError> {
            Err("credentials expired".into())
        }
    }

    async fn run_handler(
        headers: HeaderMap,
        Json(input): Json<ExecutionInput>,
    ) -> Result<Json<ExecutionResult>, StatusCode> {
        let authorized = headers
            .get(header::AUTHORIZATION)
            .is_some_and(|value| value == "Bearer secret");
        if !authorized {
            return Err(StatusCode::UNAUTHORIZED);
        }

        let outputs = [("y".to_owned(), json!(10))].into_iter().collect();
        Ok(Json(ExecutionResult::ok(input.job_id, outputs)))
    }

    async fn serve(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn config(addr: SocketAddr) -> RemoteRuntimeConfig {
        RemoteRuntimeConfig::default()
            .with_runtime_url(format!("http://{addr}/api"))
            .with_timeout(5)
    }

    fn router() -> Router {
        Router::new()
            .route("/api/runtime", post(run_handler))
            .route("/api/info", get(|| async { Json(runtime_info()) }))
    }

    #[tokio::test]
    async fn test_run_round_trip() {
        let addr = serve(router()).await;
        let client = RemoteRuntimeClient::new(config(addr), StaticToken::new("secret")).unwrap();
        let input = fixtures::execution_input();

        let result = client.run(&input).await.unwrap();
        assert!(result.is_ok());
        assert_eq!(result.job_id, input.job_id);
        assert_eq!(result.output_results_by_output_name["y"], json!(10));

        let info = client.info().await.unwrap();
        assert_eq!(info, runtime_info());
    }

    #[tokio::test]
    async fn test_error_status_is_connection_error() {
        let addr = serve(router()).await;
        let client = RemoteRuntimeClient::new(config(addr), NoAuth).unwrap();

        let err = client.run(&fixtures::execution_input()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RuntimeConnection);
    }

    #[tokio::test]
    async fn test_token_failure_is_connection_error() {
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&requests);
        let router = Router::new().route(
            "/api/runtime",
            post(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { StatusCode::OK }
            }),
        );
        let addr = serve(router).await;
        let client = RemoteRuntimeClient::new(config(addr), ExpiredCredentials).unwrap();

        let err = client.run(&fixtures::execution_input()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RuntimeConnection);
        assert!(err.to_string().contains("credentials expired"), "unexpected error: {err}");
        assert_eq!(requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_body_is_result_validation_error() {
        let router = Router::new().route(
            "/api/runtime",
            post(|| async { Json(json!({"unexpected": true})) }),
        );
        let addr = serve(router).await;
        let client = RemoteRuntimeClient::new(config(addr), NoAuth).unwrap();

        let err = client.run(&fixtures::execution_input()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResultValidation);
    }

    #[tokio::test]
    async fn test_unreachable_runtime_is_connection_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = RemoteRuntimeClient::new(config(addr), NoAuth).unwrap();
        let err = client.run(&fixtures::execution_input()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RuntimeConnection);
    }

    #[test]
    fn test_missing_url_rejected() {
        let err = RemoteRuntimeClient::new(RemoteRuntimeConfig::default(), NoAuth).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RuntimeConnection);
    }

    #[test]
    fn test_base_url_keeps_path() {
        let config = RemoteRuntimeConfig::default().with_runtime_url("http://localhost:8090/engine");
        let client = RemoteRuntimeClient::new(config, NoAuth).unwrap();
        assert_eq!(client.endpoint("runtime").unwrap().as_str(), "http://localhost:8090/engine/runtime");
    }
}
