//! HTTP transport implementation using `reqwest`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::{ApiRequest, ApiResponse, HttpTransport, RequestId, TransportError};

/// Counter for generating unique request IDs.
static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

const DEFAULT_USER_AGENT: &str =
    concat!("banquet/", env!("CARGO_PKG_VERSION"));

/// A `reqwest`-backed [`HttpTransport`] bound to one API base URL.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Creates a transport with default settings.
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        Self::builder().base_url(base_url).build()
    }

    /// Creates a new builder.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// The base URL requests are joined onto (no trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, request: &ApiRequest) -> String {
        let path = &request.path;
        if request.is_absolute() {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

impl HttpTransport for ReqwestTransport {
    async fn send(
        &self,
        request: ApiRequest,
    ) -> Result<ApiResponse, TransportError> {
        let id =
            RequestId::new(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed));
        let url = self.url_for(&request);
        let method = request.method.clone();

        let mut builder = self
            .client
            .request(request.method, &url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        tracing::debug!(%id, %method, %url, "sending request");

        let response = builder.send().await.map_err(|e| {
            tracing::debug!(%id, error = %e, "request failed");
            TransportError::Request(e.to_string())
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        tracing::debug!(%id, status = status.as_u16(), "response received");

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug, Default)]
pub struct ReqwestTransportBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ReqwestTransportBuilder {
    /// Sets the base URL, e.g. `http://localhost:4000`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Builds the transport.
    ///
    /// # Errors
    /// [`TransportError::Configuration`] if no base URL was given or the
    /// underlying client cannot be constructed.
    pub fn build(self) -> Result<ReqwestTransport, TransportError> {
        let base_url = self.base_url.ok_or_else(|| {
            TransportError::Configuration("base_url is required".into())
        })?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut client = reqwest::Client::builder().user_agent(
            self.user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        );
        if let Some(timeout) = self.timeout {
            client = client.timeout(timeout);
        }
        let client = client
            .build()
            .map_err(|e| TransportError::Configuration(e.to_string()))?;

        Ok(ReqwestTransport { client, base_url })
    }
}
