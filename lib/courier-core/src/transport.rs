//! Transport collaborator.
//!
//! The request builder never touches the network itself. It assembles
//! [`TransportParams`] and hands them, with the method and resolved URL, to a
//! [`Transport`]. Whatever the transport returns, response or error, reaches
//! the caller unchanged.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use url::Url;

use crate::{Key, Map, Method, Payload, Response, Result, Value, flatten};

/// Request headers as name/value pairs.
pub type Headers = HashMap<String, String>;

/// Core HTTP transport trait.
///
/// Implementations own connection handling, TLS, timeouts and status
/// interpretation. The builder does not retry or wrap their errors.
pub trait Transport: Send + Sync {
    /// Send one request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails for any reason:
    /// - Network errors
    /// - TLS errors
    /// - Timeouts
    /// - HTTP error statuses, if the transport treats them as errors
    fn send(
        &self,
        method: Method,
        url: &Url,
        params: TransportParams,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn send(
        &self,
        method: Method,
        url: &Url,
        params: TransportParams,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send {
        (**self).send(method, url, params)
    }
}

/// Everything a transport needs besides method and URL.
///
/// Exactly one payload (and so one format key) is present per request.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportParams {
    /// Encoded body, tagged with its format.
    pub payload: Payload,
    /// Request headers, if any were configured.
    pub headers: Option<Headers>,
    /// Whether the transport should trace this request in detail.
    pub debug: bool,
    /// Remaining transport-level options (e.g. `timeout`, `http_errors`).
    pub options: Map,
}

impl TransportParams {
    /// Parameters with no extra options.
    #[must_use]
    pub fn new(payload: Payload, headers: Option<Headers>, debug: bool) -> Self {
        Self {
            payload,
            headers,
            debug,
            options: Map::new(),
        }
    }

    /// Transport key of the payload (`query`, `form_params`, `json` or `multipart`).
    #[must_use]
    pub const fn format_key(&self) -> &'static str {
        self.payload.key()
    }

    /// Merge caller options over the assembled parameters.
    ///
    /// Options win: `debug` sets the flag by truthiness, `headers` replaces
    /// the headers (a map, or `null` for none), and the key of the selected
    /// format replaces the payload when it holds a map or `null`. Any other
    /// entry is kept in [`TransportParams::options`].
    ///
    /// A multipart override is flattened, so it may fail like
    /// [`flatten`] does.
    pub fn merge_options(mut self, options: &Map) -> Result<Self> {
        for (key, value) in options {
            let Key::Str(name) = key else {
                self.options.insert(key.clone(), value.clone());
                continue;
            };

            if name == "debug" {
                self.debug = value.is_truthy();
            } else if name == "headers" {
                self.headers = headers_from_value(value);
            } else if let Some(payload) = self.override_payload(name, value)? {
                self.payload = payload;
            } else {
                self.options.insert(key.clone(), value.clone());
            }
        }
        Ok(self)
    }

    /// Numeric option as `f64`, if present.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn option_f64(&self, name: &str) -> Option<f64> {
        match self.options.get(name)?.as_scalar()? {
            crate::Scalar::Int(i) => Some(*i as f64),
            crate::Scalar::Float(f) => Some(*f),
            crate::Scalar::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Boolean option by truthiness, if present.
    #[must_use]
    pub fn option_bool(&self, name: &str) -> Option<bool> {
        self.options.get(name).map(Value::is_truthy)
    }

    fn override_payload(&self, name: &str, value: &Value) -> Result<Option<Payload>> {
        if name != self.format_key() {
            return Ok(None);
        }
        let body = match value {
            Value::Map(map) => Some(map),
            Value::Scalar(scalar) if scalar.is_null() => None,
            _ => return Ok(None),
        };
        Ok(Some(match self.payload {
            Payload::Query(_) => Payload::Query(body.cloned()),
            Payload::FormParams(_) => Payload::FormParams(body.cloned()),
            Payload::Json(_) => Payload::Json(body.cloned()),
            Payload::Multipart(_) => Payload::Multipart(match body {
                Some(body) => flatten(body)?,
                None => Vec::new(),
            }),
        }))
    }
}

fn headers_from_value(value: &Value) -> Option<Headers> {
    let map = value.as_map()?;
    Some(
        map.iter()
            .filter_map(|(name, value)| {
                let scalar = value.as_scalar().filter(|s| !s.is_null())?;
                Some((name.to_string(), scalar.to_field_string()))
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FieldRecord, map};

    fn json_params() -> TransportParams {
        TransportParams::new(
            Payload::Json(Some(map! { "x" => 1 })),
            Some(Headers::from([("Accept".to_string(), "application/json".to_string())])),
            false,
        )
    }

    #[test]
    fn format_key_matches_payload() {
        assert_eq!(json_params().format_key(), "json");
        let params = TransportParams::new(Payload::Multipart(Vec::new()), None, false);
        assert_eq!(params.format_key(), "multipart");
    }

    #[test]
    fn options_override_debug() {
        let params = json_params()
            .merge_options(&map! { "debug" => true })
            .expect("merge");
        assert!(params.debug);
        assert_eq!(params.payload, Payload::Json(Some(map! { "x" => 1 })));
        assert!(params.options.is_empty());

        let params = TransportParams::new(Payload::Query(None), None, true)
            .merge_options(&map! { "debug" => false })
            .expect("merge");
        assert!(!params.debug);
    }

    #[test]
    fn options_override_headers() {
        let params = json_params()
            .merge_options(&map! { "headers" => map! { "X-Trace" => "abc", "X-Count" => 2, "X-None" => Value::NULL } })
            .expect("merge");
        let headers = params.headers.expect("headers");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("X-Trace").map(String::as_str), Some("abc"));
        assert_eq!(headers.get("X-Count").map(String::as_str), Some("2"));

        let params = json_params()
            .merge_options(&map! { "headers" => Value::NULL })
            .expect("merge");
        assert!(params.headers.is_none());
    }

    #[test]
    fn options_override_selected_payload_only() {
        let params = json_params()
            .merge_options(&map! { "json" => map! { "y" => 2 }, "query" => map! { "q" => 1 } })
            .expect("merge");
        assert_eq!(params.payload, Payload::Json(Some(map! { "y" => 2 })));
        assert_eq!(params.options, map! { "query" => map! { "q" => 1 } });
    }

    #[test]
    fn multipart_override_is_flattened() {
        let params = TransportParams::new(Payload::Multipart(Vec::new()), None, false)
            .merge_options(&map! { "multipart" => map! { "a" => map! { "b" => "c" } } })
            .expect("merge");
        assert_eq!(
            params.payload,
            Payload::Multipart(vec![FieldRecord::scalar("a[b]", "c")])
        );
    }

    #[test]
    fn other_options_are_carried() {
        let params = json_params()
            .merge_options(&map! { "timeout" => 2.5, "http_errors" => false, 3 => "x" })
            .expect("merge");
        assert_eq!(params.option_f64("timeout"), Some(2.5));
        assert_eq!(params.option_bool("http_errors"), Some(false));
        assert_eq!(params.option_bool("missing"), None);
        assert_eq!(params.options.len(), 3);
    }

    #[test]
    fn option_f64_accepts_integers_and_strings() {
        let params = json_params()
            .merge_options(&map! { "timeout" => 3, "connect_timeout" => "1.5" })
            .expect("merge");
        assert_eq!(params.option_f64("timeout"), Some(3.0));
        assert_eq!(params.option_f64("connect_timeout"), Some(1.5));
    }
}
