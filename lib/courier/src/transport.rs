//! HTTP transport using hyper-util.
//!
//! [`HyperTransport`] turns [`TransportParams`] into a wire request, sends it
//! through a pooled hyper client wrapped in [`LoggingLayer`], and applies the
//! per-request `timeout` and `http_errors` options.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use courier_core::{Form, Payload, StatusCode, Transport, TransportParams};
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tower::Layer;
use tower::util::BoxCloneService;
use tower_service::Service;
use tracing::debug;
use url::Url;

use crate::{
    Error, Method, Request, Response, Result,
    config::{ClientConfig, ClientConfigBuilder},
    connector::https_connector,
    middleware::{DebugTrace, LoggingLayer},
};

/// Options [`HyperTransport`] understands; anything else is ignored.
const SUPPORTED_OPTIONS: [&str; 2] = ["timeout", "http_errors"];

/// Type-erased service stack below the transport.
pub type BoxedService = BoxCloneService<Request<Bytes>, Response<Bytes>, Error>;

/// Future type for Tower Service implementation.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<Response<Bytes>>> + Send + 'static>>;

/// Per-request timeout, overriding [`ClientConfig::timeout`].
#[derive(Debug, Clone, Copy)]
struct RequestTimeout(Duration);

/// Thread-safe wrapper for `BoxedService`.
#[derive(Clone)]
struct SyncService {
    inner: Arc<Mutex<BoxedService>>,
}

impl SyncService {
    fn new(service: BoxedService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    fn call(&self, request: Request<Bytes>) -> ServiceFuture {
        // Lock, clone the service, and release the lock immediately
        let mut service = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();

        Box::pin(async move { service.call(request).await })
    }
}

/// Raw HTTP client using hyper-util.
#[derive(Clone)]
struct RawHyperClient {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    config: ClientConfig,
}

impl RawHyperClient {
    fn new(config: ClientConfig) -> Self {
        let connector = https_connector(config.connect_timeout);

        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(connector);

        Self { inner, config }
    }

    fn build_hyper_request(request: Request<Bytes>) -> Result<http::Request<Full<Bytes>>> {
        let (method, url, headers, body, extensions) = request.into_parts();

        let mut builder = http::Request::builder()
            .method(http::Method::from(method))
            .uri(url.as_str());

        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let body = body.map_or_else(Full::default, Full::new);
        let mut http_request = builder
            .body(body)
            .map_err(|e| Error::invalid_request(e.to_string()))?;

        *http_request.extensions_mut() = extensions;

        Ok(http_request)
    }

    fn extract_headers(headers: &http::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    async fn execute(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let requested = request.extensions().get::<RequestTimeout>().map(|t| t.0);
        let timeout = self.config.effective_timeout(requested);
        let hyper_request = Self::build_hyper_request(request)?;

        let response = tokio::time::timeout(timeout, self.inner.request(hyper_request))
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(Self::map_hyper_error)?;

        let status = response.status().as_u16();
        let response_headers = Self::extract_headers(response.headers());

        let body = tokio::time::timeout(timeout, response.into_body().collect())
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(|e| Error::connection(e.to_string()))?
            .to_bytes();

        Ok(Response::new(status, response_headers, body))
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
        let msg = err.to_string();

        if err.is_connect() {
            return Error::connection(msg);
        }

        if msg.contains("ssl") || msg.contains("tls") || msg.contains("certificate") {
            return Error::tls(msg);
        }

        Error::connection(msg)
    }
}

impl Service<Request<Bytes>> for RawHyperClient {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send + 'static>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let client = self.clone();
        Box::pin(async move { client.execute(request).await })
    }
}

/// [`Transport`] over hyper-util with connection pooling, TLS, and logging.
///
/// # Payload rendering
///
/// | Payload | Wire form |
/// |---------|-----------|
/// | `query` | Replaces the URL query string |
/// | `form_params` | `application/x-www-form-urlencoded` body |
/// | `json` | `application/json` body |
/// | `multipart` | `multipart/form-data` body with a fresh boundary |
///
/// Caller headers win over the default `Content-Type`, except for multipart
/// where the boundary must match the body.
///
/// # Options
///
/// - `timeout`: seconds (number), overrides [`ClientConfig::timeout`]
/// - `http_errors`: when truthy (the default), 4xx/5xx responses become
///   [`Error::Http`] carrying the body
///
/// # Example
///
/// ```ignore
/// use courier::HyperTransport;
/// use std::time::Duration;
///
/// let transport = HyperTransport::builder()
///     .timeout(Duration::from_secs(10))
///     .build();
/// ```
#[derive(Clone)]
pub struct HyperTransport {
    service: SyncService,
    config: ClientConfig,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Create a transport with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a transport with custom configuration.
    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        let raw = RawHyperClient::new(config.clone());
        let service = BoxCloneService::new(LoggingLayer::new().layer(raw));
        Self {
            service: SyncService::new(service),
            config,
        }
    }

    /// Create a new transport builder.
    #[must_use]
    pub fn builder() -> HyperTransportBuilder {
        HyperTransportBuilder::default()
    }

    /// Get the transport configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HyperTransport {
    async fn send(
        &self,
        method: Method,
        url: &Url,
        params: TransportParams,
    ) -> Result<Response<Bytes>> {
        let http_errors = params.option_bool("http_errors").unwrap_or(true);
        let request = build_request(method, url, params)?;

        let response = self.service.call(request).await?;

        if http_errors && (response.is_client_error() || response.is_server_error()) {
            let status = response.status();
            let reason = StatusCode::from_u16(status)
                .ok()
                .and_then(|code| code.canonical_reason())
                .unwrap_or("HTTP error");
            return Err(Error::http_with_body(status, reason, response.into_body()));
        }

        Ok(response)
    }
}

/// Render transport parameters as a wire request.
fn build_request(method: Method, url: &Url, params: TransportParams) -> Result<Request<Bytes>> {
    for (key, _) in &params.options {
        let name = key.to_string();
        if !SUPPORTED_OPTIONS.contains(&name.as_str()) {
            debug!(option = %name, "ignoring unsupported transport option");
        }
    }

    let timeout = request_timeout(&params);

    let mut builder = Request::builder(method, url.clone());
    if let Some(headers) = params.headers {
        builder = builder.headers(headers);
    }
    if params.debug {
        builder = builder.extension(DebugTrace);
    }
    if let Some(timeout) = timeout {
        builder = builder.extension(RequestTimeout(timeout));
    }

    let builder = match params.payload {
        Payload::Query(Some(body)) => builder.query(&body)?,
        Payload::FormParams(Some(body)) => builder.form(&body)?,
        Payload::Json(Some(body)) => builder.json(&body)?,
        Payload::Query(None) | Payload::FormParams(None) | Payload::Json(None) => builder,
        Payload::Multipart(fields) => builder.multipart(Form::new().fields(&fields)),
    };

    Ok(builder.build())
}

/// The `timeout` option as a duration; zero, negative and unrepresentable
/// values fall back to the configured timeout.
fn request_timeout(params: &TransportParams) -> Option<Duration> {
    let secs = params.option_f64("timeout")?;
    let timeout = Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|timeout| !timeout.is_zero());
    if timeout.is_none() {
        debug!(secs, "ignoring unusable timeout option");
    }
    timeout
}

/// Builder for [`HyperTransport`].
#[derive(Debug, Default)]
pub struct HyperTransportBuilder {
    config: ClientConfigBuilder,
}

impl HyperTransportBuilder {
    /// Set the default request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.config = self.config.pool_idle_per_host(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.pool_idle_timeout(timeout);
        self
    }

    /// Build the transport.
    #[must_use]
    pub fn build(self) -> HyperTransport {
        HyperTransport::with_config(self.config.build())
    }
}
