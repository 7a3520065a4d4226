//! Fluent request builder.
//!
//! [`Courier`] accumulates a target URI, body, headers, options, default
//! parameters and a payload format across chained calls, then dispatches one
//! request through its [`Transport`].
//!
//! # Dispatch
//!
//! Every terminal operation ([`Courier::get`], [`Courier::request`], ...)
//! runs the same steps:
//!
//! 1. Default parameters fill keys absent from the body (body values win).
//! 2. The effective body is encoded for the selected [`Format`]; multipart
//!    bodies are flattened into bracket-named fields, reading files eagerly.
//! 3. Payload, headers and the debug flag become [`TransportParams`].
//! 4. Options are merged over them and win on conflicts.
//! 5. The transport sends the request; its response or error is returned
//!    unchanged.
//!
//! The debug flag is cleared as soon as dispatch starts, so it never leaks
//! into the next request whatever the outcome. The builder's own body is not
//! modified by dispatch.
//!
//! # Example
//!
//! ```ignore
//! use courier::prelude::*;
//!
//! let mut courier = Courier::new();
//! let response = courier
//!     .make("https://api.example.com/v1/")
//!     .to("users")
//!     .with_body(map! { "user" => map! { "name" => "Ann" } })
//!     .with_param_default(map! { "token" => "abc" })
//!     .as_json()
//!     .post()
//!     .await?;
//! ```

use bytes::Bytes;
use courier_core::{
    Contents, Format, Headers, Map, Payload, Transport, TransportParams, encode, merge_defaults,
};
use tracing::{Instrument, debug, info, info_span};
use url::Url;

use crate::{Error, HyperTransport, Method, Response, Result};

/// Fluent HTTP request builder over a [`Transport`].
///
/// Setters take `&mut self` and return it for chaining. Each setter replaces
/// what an earlier call set. The builder is not meant to be shared across
/// threads; use one per concurrent request.
#[derive(Debug, Clone)]
pub struct Courier<T = HyperTransport> {
    transport: T,
    base_uri: Option<String>,
    uri: Option<String>,
    body: Option<Map>,
    headers: Option<Headers>,
    options: Option<Map>,
    param_default: Option<Map>,
    format: Format,
    debug: bool,
}

impl Courier<HyperTransport> {
    /// Builder over a default [`HyperTransport`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_transport(HyperTransport::new())
    }
}

impl Default for Courier<HyperTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Courier<T> {
    /// Builder over the given transport.
    #[must_use]
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            base_uri: None,
            uri: None,
            body: None,
            headers: None,
            options: None,
            param_default: None,
            format: Format::default(),
            debug: false,
        }
    }

    /// Set the base URI that destinations are resolved against.
    ///
    /// Resolution follows RFC 3986: keep a trailing `/` on the base when
    /// relative destinations should be appended to its path.
    pub fn make(&mut self, base_uri: impl Into<String>) -> &mut Self {
        self.base_uri = Some(base_uri.into());
        self
    }

    /// Set the destination, relative to the base URI or absolute.
    pub fn to(&mut self, uri: impl Into<String>) -> &mut Self {
        self.uri = Some(uri.into());
        self
    }

    /// Set body, headers and options at once.
    pub fn with(
        &mut self,
        body: impl Into<Option<Map>>,
        headers: impl Into<Option<Headers>>,
        options: impl Into<Option<Map>>,
    ) -> &mut Self {
        self.body = body.into();
        self.headers = headers.into();
        self.options = options.into();
        self
    }

    /// Set the body.
    pub fn with_body(&mut self, body: impl Into<Option<Map>>) -> &mut Self {
        self.body = body.into();
        self
    }

    /// Set the request headers.
    pub fn with_headers(&mut self, headers: impl Into<Option<Headers>>) -> &mut Self {
        self.headers = headers.into();
        self
    }

    /// Set transport options, merged last so they override everything else.
    pub fn with_options(&mut self, options: impl Into<Option<Map>>) -> &mut Self {
        self.options = options.into();
        self
    }

    /// Set parameters that fill keys missing from the body.
    pub fn with_param_default(&mut self, defaults: impl Into<Option<Map>>) -> &mut Self {
        self.param_default = defaults.into();
        self
    }

    /// Send the body as the URL query string.
    pub fn as_query(&mut self) -> &mut Self {
        self.as_format(Format::Query)
    }

    /// Send the body form-urlencoded.
    pub fn as_form_params(&mut self) -> &mut Self {
        self.as_format(Format::FormParams)
    }

    /// Send the body as JSON.
    pub fn as_json(&mut self) -> &mut Self {
        self.as_format(Format::Json)
    }

    /// Send the body as multipart form data.
    pub fn as_multipart(&mut self) -> &mut Self {
        self.as_format(Format::Multipart)
    }

    /// Select the payload format.
    pub fn as_format(&mut self, format: Format) -> &mut Self {
        self.format = format;
        self
    }

    /// Toggle detailed tracing for the next dispatch only.
    pub fn debug(&mut self, debug: bool) -> &mut Self {
        self.debug = debug;
        self
    }

    /// The transport requests are sent through.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Selected payload format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Whether the next dispatch is traced in detail.
    #[must_use]
    pub const fn is_debug(&self) -> bool {
        self.debug
    }

    /// Body as last set.
    #[must_use]
    pub const fn body(&self) -> Option<&Map> {
        self.body.as_ref()
    }

    /// Headers as last set.
    #[must_use]
    pub const fn headers(&self) -> Option<&Headers> {
        self.headers.as_ref()
    }

    /// Transport options as last set.
    #[must_use]
    pub const fn options(&self) -> Option<&Map> {
        self.options.as_ref()
    }

    /// Default parameters as last set.
    #[must_use]
    pub const fn param_default(&self) -> Option<&Map> {
        self.param_default.as_ref()
    }

    /// Send a GET request.
    pub async fn get(&mut self) -> Result<Response<Bytes>> {
        self.send(Method::Get).await
    }

    /// Send a POST request.
    pub async fn post(&mut self) -> Result<Response<Bytes>> {
        self.send(Method::Post).await
    }

    /// Send a PUT request.
    pub async fn put(&mut self) -> Result<Response<Bytes>> {
        self.send(Method::Put).await
    }

    /// Send a PATCH request.
    pub async fn patch(&mut self) -> Result<Response<Bytes>> {
        self.send(Method::Patch).await
    }

    /// Send a DELETE request.
    pub async fn delete(&mut self) -> Result<Response<Bytes>> {
        self.send(Method::Delete).await
    }

    /// Send a request with a method given by name, in any case.
    ///
    /// Fails with [`Error::InvalidMethod`] for anything but GET, POST, PUT,
    /// PATCH and DELETE; nothing is dispatched then and the builder is left
    /// as it was.
    pub async fn request(&mut self, method: &str) -> Result<Response<Bytes>> {
        let method: Method = method.parse()?;
        self.send(method).await
    }

    /// Send a request with the given method.
    pub async fn send(&mut self, method: Method) -> Result<Response<Bytes>> {
        let debug = std::mem::take(&mut self.debug);
        let format = self.format;

        let body = match &self.param_default {
            Some(defaults) => Some(merge_defaults(self.body.as_ref(), defaults)),
            None => self.body.clone(),
        };
        let payload = encode(body.as_ref(), format)?;

        let mut params = TransportParams::new(payload, self.headers.clone(), debug);
        if let Some(options) = &self.options {
            params = params.merge_options(options)?;
        }

        let url = resolve_url(self.base_uri.as_deref(), self.uri.as_deref())?;

        let span = info_span!("courier.dispatch", %method, %format);
        async {
            info!(url = %url, "dispatching request");
            if params.debug {
                debug!(
                    payload = ?describe_payload(&params.payload),
                    headers = ?params.headers,
                    options = ?params.options,
                    "transport parameters"
                );
            }
            self.transport.send(method, &url, params).await
        }
        .instrument(span)
        .await
    }
}

/// Payload outline for debug logs: top-level keys, or multipart field names
/// with sizes. File contents are never included.
fn describe_payload(payload: &Payload) -> Vec<String> {
    match payload {
        Payload::Multipart(fields) => fields
            .iter()
            .map(|field| {
                let size = match field.contents() {
                    Contents::Bytes(bytes) => bytes.len(),
                    Contents::Scalar(scalar) => scalar.to_field_string().len(),
                };
                match field.filename() {
                    Some(filename) => format!("{}: {filename} ({size} bytes)", field.name()),
                    None => format!("{} ({size} bytes)", field.name()),
                }
            })
            .collect(),
        Payload::Query(map) | Payload::FormParams(map) | Payload::Json(map) => map
            .iter()
            .flat_map(Map::keys)
            .map(ToString::to_string)
            .collect(),
    }
}

/// Destination resolved against the base URI, or either one alone.
fn resolve_url(base_uri: Option<&str>, uri: Option<&str>) -> Result<Url> {
    match (base_uri, uri) {
        (Some(base), Some(uri)) => Ok(Url::parse(base)?.join(uri)?),
        (Some(only), None) | (None, Some(only)) => Ok(Url::parse(only)?),
        (None, None) => Err(Error::invalid_request(
            "no request URI: set one with `make` or `to`",
        )),
    }
}
