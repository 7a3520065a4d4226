//! Plain-data HTTP requests handed to the wire client.
//!
//! Use [`Request::builder`] to construct requests with headers, a query
//! string, and a body.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use courier_core::{Request, Method, map};
//!
//! let request = Request::<Bytes>::builder(Method::Get, "https://api.example.com/search".parse().unwrap())
//!     .header("Accept", "application/json")
//!     .query(&map! { "q" => "rust" })
//!     .expect("query")
//!     .build();
//!
//! assert_eq!(request.url().as_str(), "https://api.example.com/search?q=rust");
//! ```

use std::collections::HashMap;

use bytes::Bytes;

use crate::{ContentType, Form, Map, Method};

/// An HTTP request with method, URL, headers, and optional body.
#[derive(Debug, Clone)]
pub struct Request<B = Bytes> {
    method: Method,
    url: url::Url,
    headers: HashMap<String, String>,
    body: Option<B>,
    extensions: http::Extensions,
}

impl<B> Request<B> {
    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, url: url::Url) -> RequestBuilder<B> {
        RequestBuilder::new(method, url)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request URL.
    #[must_use]
    pub fn url(&self) -> &url::Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Single header value by name, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> Option<&B> {
        self.body.as_ref()
    }

    /// Typed extensions attached by the caller (e.g. tracing markers).
    #[must_use]
    pub const fn extensions(&self) -> &http::Extensions {
        &self.extensions
    }

    /// Mutable access to extensions.
    #[must_use]
    pub fn extensions_mut(&mut self) -> &mut http::Extensions {
        &mut self.extensions
    }

    /// Consume into (method, url, headers, body, extensions).
    #[must_use]
    pub fn into_parts(
        self,
    ) -> (
        Method,
        url::Url,
        HashMap<String, String>,
        Option<B>,
        http::Extensions,
    ) {
        (
            self.method,
            self.url,
            self.headers,
            self.body,
            self.extensions,
        )
    }
}

/// Builder for constructing [`Request`] instances.
#[derive(Debug, Clone)]
pub struct RequestBuilder<B = Bytes> {
    method: Method,
    url: url::Url,
    headers: HashMap<String, String>,
    body: Option<B>,
    extensions: http::Extensions,
}

impl<B> RequestBuilder<B> {
    /// Creates a new builder.
    #[must_use]
    pub fn new(method: Method, url: url::Url) -> Self {
        Self {
            method,
            url,
            headers: HashMap::new(),
            body: None,
            extensions: http::Extensions::new(),
        }
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets a header unless one with the same name (any case) is present.
    #[must_use]
    pub fn default_header(self, name: &str, value: impl Into<String>) -> Self {
        if find_header(&self.headers, name).is_some() {
            self
        } else {
            self.header(name, value)
        }
    }

    /// Sets multiple headers.
    #[must_use]
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Replaces the URL query string with the encoded body.
    ///
    /// An empty body clears the query string.
    pub fn query(mut self, body: &Map) -> crate::Result<Self> {
        let query = crate::to_query_string(body)?;
        self.url
            .set_query(Some(query.as_str()).filter(|q| !q.is_empty()));
        Ok(self)
    }

    /// Inserts a typed extension.
    #[must_use]
    pub fn extension<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.extensions.insert(value);
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: B) -> Self {
        self.body = Some(body);
        self
    }

    /// Builds the [`Request`].
    #[must_use]
    pub fn build(self) -> Request<B> {
        Request {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
            extensions: self.extensions,
        }
    }
}

impl RequestBuilder<Bytes> {
    /// Set a JSON body, defaulting `Content-Type` to `application/json`.
    pub fn json<T: serde::Serialize>(self, value: &T) -> crate::Result<Self> {
        let body = crate::to_json(value)?;
        Ok(self
            .default_header("Content-Type", ContentType::Json.as_str())
            .body(body))
    }

    /// Set a form-urlencoded body with bracketed field names.
    pub fn form(self, body: &Map) -> crate::Result<Self> {
        let body = crate::to_form(body)?;
        Ok(self
            .default_header("Content-Type", ContentType::FormUrlEncoded.as_str())
            .body(body))
    }

    /// Set a multipart body; the form's boundary always wins the `Content-Type`.
    #[must_use]
    pub fn multipart(mut self, form: Form) -> Self {
        self.headers
            .retain(|name, _| !name.eq_ignore_ascii_case("content-type"));
        let (content_type, body) = form.into_body();
        self.header("Content-Type", content_type).body(body)
    }
}

fn find_header<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FieldRecord, map};

    fn url(s: &str) -> url::Url {
        url::Url::parse(s).expect("valid URL")
    }

    #[test]
    fn request_builder_basic() {
        let request = Request::<Bytes>::builder(Method::Get, url("https://api.example.com/users"))
            .header("Accept", "application/json")
            .build();

        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.url().as_str(), "https://api.example.com/users");
        assert_eq!(request.header("accept"), Some("application/json"));
        assert!(request.body().is_none());
    }

    #[test]
    fn query_replaces_existing_query_string() {
        let request = Request::<Bytes>::builder(Method::Get, url("https://api.example.com/s?old=1"))
            .query(&map! { "q" => "a b", "f" => map! { "x" => 1 } })
            .expect("query")
            .build();

        assert_eq!(
            request.url().as_str(),
            "https://api.example.com/s?q=a%20b&f%5Bx%5D=1"
        );
    }

    #[test]
    fn empty_query_clears_query_string() {
        let request = Request::<Bytes>::builder(Method::Get, url("https://api.example.com/s?old=1"))
            .query(&Map::new())
            .expect("query")
            .build();

        assert_eq!(request.url().as_str(), "https://api.example.com/s");
    }

    #[test]
    fn json_keeps_caller_content_type() {
        let request = Request::builder(Method::Post, url("https://api.example.com/users"))
            .header("content-type", "application/vnd.api+json")
            .json(&map! { "x" => 1 })
            .expect("json")
            .build();

        assert_eq!(request.header("Content-Type"), Some("application/vnd.api+json"));
        assert_eq!(request.headers().len(), 1);
        assert_eq!(request.body().map(|b| &b[..]), Some(br#"{"x":1}"#.as_slice()));
    }

    #[test]
    fn form_sets_content_type() {
        let request = Request::builder(Method::Post, url("https://api.example.com/login"))
            .form(&map! { "user" => "ann" })
            .expect("form")
            .build();

        assert_eq!(
            request.header("Content-Type"),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(request.body().map(|b| &b[..]), Some(b"user=ann".as_slice()));
    }

    #[test]
    fn multipart_overrides_content_type() {
        let form = Form::with_boundary("b0").fields(&[FieldRecord::scalar("a", "1")]);
        let request = Request::builder(Method::Post, url("https://api.example.com/upload"))
            .header("content-type", "text/plain")
            .multipart(form)
            .build();

        assert_eq!(
            request.header("Content-Type"),
            Some("multipart/form-data; boundary=b0")
        );
        assert_eq!(request.headers().len(), 1);
    }

    #[test]
    fn extensions_survive_build() {
        #[derive(Debug, Clone, PartialEq)]
        struct Marker(u8);

        let request = Request::<Bytes>::builder(Method::Get, url("https://api.example.com"))
            .extension(Marker(7))
            .build();

        assert_eq!(request.extensions().get::<Marker>(), Some(&Marker(7)));
    }
}
