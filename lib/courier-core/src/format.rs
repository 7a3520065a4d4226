//! Outbound payload formats.

use derive_more::Display;

/// How the request body is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum Format {
    /// Encoded into the URL query string.
    #[default]
    #[display("query")]
    Query,
    /// `application/x-www-form-urlencoded` body.
    #[display("form_params")]
    FormParams,
    /// `application/json` body.
    #[display("json")]
    Json,
    /// `multipart/form-data` body with bracketed field names.
    #[display("multipart")]
    Multipart,
}

impl Format {
    /// Transport parameter key carrying the payload for this format.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::FormParams => "form_params",
            Self::Json => "json",
            Self::Multipart => "multipart",
        }
    }
}
