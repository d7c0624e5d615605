//! Request executor
//!
//! `Gateway::request` performs one logical API call. It recovers from exactly
//! one failure class, an expired access token: a 401 from any endpoint other
//! than the refresh endpoint joins (or starts) a refresh episode and then
//! re-issues the identical request once with freshly built headers. The
//! retried response is final.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{
    AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, PRAGMA,
};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tailor_auth::{KeyValueStore, REFRESH_TOKEN_PATH, credentials};
use tracing::{Instrument, debug, error, info_span, warn};

use crate::body::{Body, ErrorBody, read_body};
use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::hooks::{Hooks, Lifecycle};
use crate::navigator::Navigator;
use crate::refresh::RefreshCoordinator;
use crate::url;

/// Header carrying the client identification.
pub const CLIENT_HEADER: HeaderName = HeaderName::from_static("x-client");

/// Per-call request description. Defaults to `POST` with no body.
#[derive(Debug)]
pub struct RequestOptions {
    pub method: Method,
    pub data: Option<serde_json::Value>,
    /// Merged over the default headers
    pub headers: HeaderMap,
    pub hooks: Hooks,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::POST,
            data: None,
            headers: HeaderMap::new(),
            hooks: Hooks::new(),
        }
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get() -> Self {
        Self::new().method(Method::GET)
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn json(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }
}

struct Inner {
    client: reqwest::Client,
    base_url: Option<String>,
    default_headers: HeaderMap,
    timeout: Duration,
    store: Arc<dyn KeyValueStore>,
    refresh: RefreshCoordinator,
}

/// The API gateway. Cheap to clone; clones share one refresh coordinator.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<Inner>,
}

impl Gateway {
    /// Build a gateway from validated config and its collaborators.
    pub fn new(
        config: &GatewayConfig,
        client: reqwest::Client,
        store: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        config.validate()?;

        let client_name = HeaderValue::from_str(config.client_name.trim())
            .map_err(|e| Error::Config(format!("invalid client_name: {e}")))?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(CLIENT_HEADER, client_name);
        // Responses must never come from a cache
        default_headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store"));
        default_headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

        let base_url = config.base_url().map(str::to_string);
        let refresh = RefreshCoordinator::new(
            client.clone(),
            Arc::clone(&store),
            navigator,
            base_url
                .as_deref()
                .map(|base| url::join(base, REFRESH_TOKEN_PATH)),
            default_headers.clone(),
            config.refresh_timeout(),
        );

        Ok(Self {
            inner: Arc::new(Inner {
                client,
                base_url,
                default_headers,
                timeout: config.timeout(),
                store,
                refresh,
            }),
        })
    }

    /// The refresh coordinator shared by all calls through this gateway.
    pub fn refresh_coordinator(&self) -> &RefreshCoordinator {
        &self.inner.refresh
    }

    /// Perform one API call and return its parsed body.
    ///
    /// `endpoint` is a path relative to the base URL or an absolute
    /// `http(s)://` URL. A relative endpoint without a configured base URL
    /// fails with `Error::Config` before any hook fires or any I/O happens.
    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> Result<Body> {
        let url = url::resolve(self.inner.base_url.as_deref(), endpoint)?;
        let request_id = format!("req_{}", uuid::Uuid::new_v4().as_simple());
        let span = info_span!(
            "api_request",
            request_id = %request_id,
            method = %options.method,
            url = %url
        );
        self.execute(url, options).instrument(span).await
    }

    /// `request` followed by typed deserialization of the body.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T> {
        self.request(endpoint, options).await?.deserialize()
    }

    async fn execute(&self, url: String, options: RequestOptions) -> Result<Body> {
        let RequestOptions {
            method,
            data,
            headers,
            hooks,
        } = options;

        let mut lifecycle = Lifecycle::start(hooks);
        let result = self.perform(&url, &method, data.as_ref(), &headers).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => {
                lifecycle.fail(&e.hook_message());
                e.kind()
            }
        };
        metrics::counter!("gateway_requests_total", "outcome" => outcome).increment(1);
        result
    }

    async fn perform(
        &self,
        url: &str,
        method: &Method,
        data: Option<&serde_json::Value>,
        headers: &HeaderMap,
    ) -> Result<Body> {
        let mut response = self.send(url, method, data, headers).await?;

        if response.status() == StatusCode::UNAUTHORIZED && !self.is_refresh_endpoint(url) {
            warn!("access token rejected, refreshing session");
            self.inner.refresh.refresh().await?;
            response = self.send(url, method, data, headers).await?;
        }

        let status = response.status();
        let body = read_body(response).await?;
        if !status.is_success() {
            let message = ErrorBody::classify(&body).into_message();
            debug!(status = status.as_u16(), %message, "API returned an error");
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }
        debug!(status = status.as_u16(), "request succeeded");
        Ok(body)
    }

    /// One network attempt. Headers are rebuilt per attempt so the retry
    /// carries the token stored by the refresh.
    async fn send(
        &self,
        url: &str,
        method: &Method,
        data: Option<&serde_json::Value>,
        overrides: &HeaderMap,
    ) -> Result<reqwest::Response> {
        let headers = self.build_headers(overrides).await?;
        let mut builder = self
            .inner
            .client
            .request(method.clone(), url)
            .headers(headers)
            .timeout(self.inner.timeout);
        if let Some(data) = data {
            builder = builder.json(data);
        }

        debug!("sending request");
        builder.send().await.map_err(|e| {
            error!(error = %e, "request failed");
            Error::Transport(e.to_string())
        })
    }

    async fn build_headers(&self, overrides: &HeaderMap) -> Result<HeaderMap> {
        let mut headers = self.inner.default_headers.clone();
        headers.extend(overrides.clone());

        if let Some(token) = credentials::access_token(self.inner.store.as_ref()).await? {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
                .map_err(|_| Error::Storage("stored access token is not a valid header".into()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    fn is_refresh_endpoint(&self, url: &str) -> bool {
        self.inner
            .refresh
            .refresh_url()
            .is_some_and(|refresh| url::same_endpoint(refresh, url))
    }
}
