//! Fluent HTTP request builder for Rust.
//!
//! Configure a request through chained calls, pick one of four payload
//! formats (query string, form-encoded, JSON, multipart), and dispatch it
//! through a pluggable async [`Transport`].
//!
//! # Example
//!
//! ```ignore
//! use courier::prelude::*;
//!
//! let mut courier = Courier::new();
//! courier.make("https://api.example.com/");
//!
//! let response = courier
//!     .to("profile")
//!     .with_body(map! {
//!         "user" => map! {
//!             "name" => "Ann",
//!             "avatar" => FileRef::path("pic.png"),
//!         },
//!     })
//!     .as_multipart()
//!     .post()
//!     .await?;
//! ```
//!
//! The multipart body above carries the fields `user[name]` and
//! `user[avatar]`.

mod builder;
mod config;
mod connector;
pub mod middleware;
pub mod prelude;
mod transport;

pub use builder::Courier;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use transport::{BoxedService, HyperTransport, HyperTransportBuilder, ServiceFuture};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use courier_core::{
    Contents, ContentType, Error, FieldRecord, FileRef, Form, Format, Headers, Key, Map,
    MemoryFile, Method, Part, PathFile, Payload, Request, RequestBuilder, Response, Result,
    Scalar, Transport, TransportParams, UploadedFile, Value, encode, flatten, from_json,
    guess_content_type, map, merge_defaults, query_pairs, to_form, to_json, to_query_string,
};

// Re-export http types for status codes and headers
pub use courier_core::{StatusCode, header};

pub use url;
