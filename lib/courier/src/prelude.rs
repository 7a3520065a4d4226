//! Prelude module for convenient imports.
//!
//! ```ignore
//! use courier::prelude::*;
//! ```

pub use crate::{
    ClientConfig, Courier, Error, FieldRecord, FileRef, Format, Headers, HyperTransport, Map,
    Method, Response, Result, Scalar, StatusCode, Transport, TransportParams, Value, map,
};
