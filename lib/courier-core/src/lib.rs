//! Payload encoding and core types for the courier request builder.
//!
//! This crate provides the foundational types used by courier:
//! - [`Map`], [`Value`], [`Scalar`] and [`Key`] - Nested request bodies
//! - [`FileRef`] and [`UploadedFile`] - File handles for multipart uploads
//! - [`Format`] - Query, form, JSON or multipart encoding
//! - [`encode`], [`flatten`] and [`merge_defaults`] - The payload encoder
//! - [`Transport`] and [`TransportParams`] - The HTTP transport seam
//! - [`Method`] - HTTP method enum
//! - [`Request`], [`Response`], [`Form`] - Plain-data HTTP types
//! - [`Error`] and [`Result`] - Error handling

mod body;
mod encode;
mod error;
mod file;
mod format;
mod method;
mod multipart;
pub mod prelude;
mod request;
mod response;
mod transport;
mod value;

pub use body::{ContentType, from_json, to_form, to_json, to_query_string};
pub use encode::{Contents, FieldRecord, Payload, encode, flatten, merge_defaults, query_pairs};
pub use error::{Error, Result};
pub use file::{FileRef, MemoryFile, PathFile, UploadedFile, guess_content_type};
pub use format::Format;
pub use method::Method;
pub use multipart::{Form, Part};
pub use request::{Request, RequestBuilder};
pub use response::Response;
pub use transport::{Headers, Transport, TransportParams};
pub use value::{Key, Map, Scalar, Value};

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};
