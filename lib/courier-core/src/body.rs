//! Body serialization utilities.

use bytes::Bytes;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::{Map, Result, query_pairs};

/// Characters escaped in query strings: everything except RFC 3986 unreserved.
const QUERY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Content type for request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// JSON content type (`application/json`).
    Json,
    /// Form URL-encoded content type (`application/x-www-form-urlencoded`).
    FormUrlEncoded,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serialize a value to JSON bytes.
///
/// # Example
///
/// ```
/// use courier_core::{map, to_json};
///
/// let bytes = to_json(&map! { "x" => 1, "tags" => map! { 0 => "a" } }).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"x":1,"tags":["a"]}"#);
/// ```
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Serialize a body to form URL-encoded bytes with bracketed names.
///
/// # Example
///
/// ```
/// use courier_core::{map, to_form};
///
/// let bytes = to_form(&map! { "user" => map! { "name" => "Ann Lee" } }).expect("serialize");
/// assert_eq!(bytes.as_ref(), b"user%5Bname%5D=Ann+Lee");
/// ```
pub fn to_form(body: &Map) -> Result<Bytes> {
    let pairs = query_pairs(body)?;
    serde_html_form::to_string(&pairs)
        .map(|s| Bytes::from(s.into_bytes()))
        .map_err(Into::into)
}

/// Serialize a body to an RFC 3986 query string with bracketed names.
///
/// Spaces encode as `%20`; only unreserved characters are left as-is.
///
/// # Example
///
/// ```
/// use courier_core::{map, to_query_string};
///
/// let query = to_query_string(&map! { "q" => "rust lang", "page" => map! { "n" => 2 } })
///     .expect("serialize");
/// assert_eq!(query, "q=rust%20lang&page%5Bn%5D=2");
/// ```
pub fn to_query_string(body: &Map) -> Result<String> {
    let query = query_pairs(body)?
        .iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(name, QUERY_ESCAPE),
                utf8_percent_encode(value, QUERY_ESCAPE)
            )
        })
        .collect::<Vec<_>>()
        .join("&");
    Ok(query)
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// # Example
///
/// ```
/// use courier_core::from_json;
/// use serde::Deserialize;
///
/// #[derive(Debug, PartialEq, Deserialize)]
/// struct User { name: String }
///
/// let bytes = br#"{"name":"Alice"}"#;
/// let user: User = from_json(bytes).expect("deserialize");
/// assert_eq!(user, User { name: "Alice".to_string() });
/// ```
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}
