//! Prelude module for convenient imports.
//!
//! ```ignore
//! use courier_core::prelude::*;
//! ```

pub use crate::{
    Error, FieldRecord, FileRef, Format, Headers, Map, Method, Payload, Response, Result, Scalar,
    Transport, TransportParams, Value, map,
};
