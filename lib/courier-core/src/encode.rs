//! Payload encoding.
//!
//! [`encode`] turns a request body into a transport-ready [`Payload`]. Query,
//! form and JSON bodies pass through untouched; multipart bodies are
//! flattened into an ordered list of [`FieldRecord`]s whose names use the
//! bracket convention understood by most form parsers:
//!
//! | body                          | field name |
//! |-------------------------------|------------|
//! | `{k: v}`                      | `k`        |
//! | `{a: {b: v}}`                 | `a[b]`     |
//! | `{a: {b: {c: v}}}`            | `a[b][c]`  |
//!
//! # Example
//!
//! ```
//! use courier_core::{FileRef, flatten, map};
//!
//! let body = map! {
//!     "user" => map! {
//!         "name" => "Ann",
//!         "avatar" => FileRef::memory("pic.png", vec![1, 2, 3]),
//!     },
//! };
//!
//! let fields = flatten(&body).expect("in-memory files are readable");
//! assert_eq!(fields[0].name(), "user[name]");
//! assert_eq!(fields[1].name(), "user[avatar]");
//! assert_eq!(fields[1].filename(), Some("pic.png"));
//! ```

use bytes::Bytes;

use crate::{Error, Format, Map, Result, Scalar, Value};

/// Body of a single multipart field.
#[derive(Debug, Clone, PartialEq)]
pub enum Contents {
    /// A scalar leaf; the transport decides how to stringify it.
    Scalar(Scalar),
    /// Raw file bytes.
    Bytes(Bytes),
}

impl Contents {
    /// Bytes written on the wire for this field.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Self::Scalar(scalar) => Bytes::from(scalar.to_field_string()),
            Self::Bytes(bytes) => bytes.clone(),
        }
    }
}

/// One multipart form field produced by [`flatten`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRecord {
    name: String,
    contents: Contents,
    filename: Option<String>,
    mime_type: Option<String>,
}

impl FieldRecord {
    /// A plain (non-file) field.
    #[must_use]
    pub fn scalar(name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self {
            name: name.into(),
            contents: Contents::Scalar(value.into()),
            filename: None,
            mime_type: None,
        }
    }

    /// A file field.
    #[must_use]
    pub fn file(
        name: impl Into<String>,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        contents: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            contents: Contents::Bytes(contents.into()),
            filename: Some(filename.into()),
            mime_type: Some(mime_type.into()),
        }
    }

    /// Bracketed field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field contents.
    #[must_use]
    pub const fn contents(&self) -> &Contents {
        &self.contents
    }

    /// Original filename, for file fields.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// MIME type, for file fields.
    #[must_use]
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    /// Returns `true` if this field carries a file.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        self.filename.is_some()
    }
}

/// A transport-ready body, tagged by format.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Body to encode into the query string.
    Query(Option<Map>),
    /// Body to send form-urlencoded.
    FormParams(Option<Map>),
    /// Body to send as JSON.
    Json(Option<Map>),
    /// Flattened multipart fields.
    Multipart(Vec<FieldRecord>),
}

impl Payload {
    /// Format this payload was encoded for.
    #[must_use]
    pub const fn format(&self) -> Format {
        match self {
            Self::Query(_) => Format::Query,
            Self::FormParams(_) => Format::FormParams,
            Self::Json(_) => Format::Json,
            Self::Multipart(_) => Format::Multipart,
        }
    }

    /// Transport parameter key for this payload.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.format().key()
    }

    /// Returns the body map for query, form and JSON payloads.
    #[must_use]
    pub const fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Query(map) | Self::FormParams(map) | Self::Json(map) => map.as_ref(),
            Self::Multipart(_) => None,
        }
    }

    /// Returns the fields of a multipart payload.
    #[must_use]
    pub fn fields(&self) -> Option<&[FieldRecord]> {
        match self {
            Self::Multipart(fields) => Some(fields),
            _ => None,
        }
    }
}

/// Encode a body for the given format.
///
/// Only [`Format::Multipart`] transforms the body; it fails with
/// [`Error::Encoding`] when an attached file cannot be read. A missing body
/// encodes to an empty field list.
pub fn encode(body: Option<&Map>, format: Format) -> Result<Payload> {
    Ok(match format {
        Format::Query => Payload::Query(body.cloned()),
        Format::FormParams => Payload::FormParams(body.cloned()),
        Format::Json => Payload::Json(body.cloned()),
        Format::Multipart => Payload::Multipart(match body {
            Some(body) => flatten(body)?,
            None => Vec::new(),
        }),
    })
}

/// Flatten a nested body into multipart fields, depth-first, in key order.
///
/// Empty nested maps produce no field. File contents are read eagerly.
pub fn flatten(body: &Map) -> Result<Vec<FieldRecord>> {
    let mut fields = Vec::new();
    walk(body, "", "", &mut |name: String, value: &Value| {
        let field = match value {
            Value::File(file) => {
                let contents = file
                    .read_all_bytes()
                    .map_err(|source| Error::encoding(name.clone(), source))?;
                FieldRecord::file(name, file.original_filename(), file.mime_type(), contents)
            }
            Value::Scalar(scalar) => FieldRecord::scalar(name, scalar.clone()),
            Value::Map(_) => return Ok(()),
        };
        fields.push(field);
        Ok(())
    })?;
    Ok(fields)
}

/// Flatten a nested body into `(name, value)` pairs for query and form bodies.
///
/// Names follow the same bracket convention as [`flatten`]. Null leaves are
/// omitted and booleans render as `1`/`0`. Files cannot be sent this way.
pub fn query_pairs(body: &Map) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    walk(body, "", "", &mut |name: String, value: &Value| match value {
        Value::Scalar(scalar) => {
            if let Some(text) = scalar.to_pair_string() {
                pairs.push((name, text));
            }
            Ok(())
        }
        Value::File(file) => Err(Error::invalid_request(format!(
            "field '{name}' holds file '{}', which needs a multipart body",
            file.original_filename()
        ))),
        Value::Map(_) => Ok(()),
    })?;
    Ok(pairs)
}

/// Merge default parameters under a body.
///
/// Body entries win and keep their order; defaults only fill absent keys and
/// are appended in their own order. A missing body is treated as empty.
#[must_use]
pub fn merge_defaults(body: Option<&Map>, defaults: &Map) -> Map {
    let mut merged = body.cloned().unwrap_or_default();
    for (key, value) in defaults {
        if !merged.contains_key(key.clone()) {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Visit every non-map leaf with its bracketed name.
///
/// A child of key `k` is named `prefix + k + suffix`; a nested map under `k`
/// recurses with `prefix + k + suffix + "["` and `"]"`.
fn walk<F>(node: &Map, prefix: &str, suffix: &str, visit: &mut F) -> Result<()>
where
    F: FnMut(String, &Value) -> Result<()>,
{
    for (key, value) in node {
        match value {
            Value::Map(child) => {
                let child_prefix = format!("{prefix}{key}{suffix}[");
                walk(child, &child_prefix, "]", visit)?;
            }
            leaf => visit(format!("{prefix}{key}{suffix}"), leaf)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;
    use crate::{FileRef, PathFile, map};

    fn names(fields: &[FieldRecord]) -> Vec<&str> {
        fields.iter().map(FieldRecord::name).collect()
    }

    #[test]
    fn flatten_depth_naming() {
        let body = map! {
            "k" => "v1",
            "a" => map! { "b" => "v2" },
            "x" => map! { "y" => map! { "z" => "v3" } },
        };

        let fields = flatten(&body).expect("flatten");
        check!(names(&fields) == ["k", "a[b]", "x[y][z]"]);
    }

    #[test]
    fn flatten_preserves_sibling_order() {
        let body = map! {
            "z" => 1,
            "a" => map! { "y" => 2, "b" => 3, "m" => map! { "q" => 4, "c" => 5 } },
            "m" => 6,
        };

        let fields = flatten(&body).expect("flatten");
        check!(names(&fields) == ["z", "a[y]", "a[b]", "a[m][q]", "a[m][c]", "m"]);
    }

    #[test]
    fn flatten_skips_empty_maps_and_counts_leaves() {
        let body = map! {
            "empty" => Map::new(),
            "outer" => map! { "inner" => Map::new(), "leaf" => true },
            "file" => FileRef::memory("a.txt", "a"),
            "none" => Value::NULL,
        };

        let fields = flatten(&body).expect("flatten");
        check!(names(&fields) == ["outer[leaf]", "file", "none"]);
    }

    #[test]
    fn flatten_integer_keys() {
        let body = map! { "tags" => map! { 0 => "rust", 1 => "http" }, 7 => "seven" };

        let fields = flatten(&body).expect("flatten");
        check!(names(&fields) == ["tags[0]", "tags[1]", "7"]);
    }

    #[test]
    fn flatten_user_with_avatar() {
        let picture = vec![0x89, 0x50, 0x4E, 0x47];
        let body = map! {
            "user" => map! {
                "name" => "Ann",
                "avatar" => FileRef::memory("pic.png", picture.clone()),
            },
        };

        let fields = flatten(&body).expect("flatten");

        check!(
            fields
                == [
                    FieldRecord::scalar("user[name]", "Ann"),
                    FieldRecord::file("user[avatar]", "pic.png", "image/png", picture),
                ]
        );
        let name = fields.first().expect("name field");
        check!(!name.is_file());
        check!(name.filename().is_none());
        check!(name.mime_type().is_none());
    }

    #[test]
    fn flatten_scalar_contents_are_untouched() {
        let body = map! { "n" => 3, "f" => 2.5, "b" => false, "s" => "x" };
        let fields = flatten(&body).expect("flatten");

        let contents: Vec<&Contents> = fields.iter().map(FieldRecord::contents).collect();
        check!(
            contents
                == [
                    &Contents::Scalar(Scalar::Int(3)),
                    &Contents::Scalar(Scalar::Float(2.5)),
                    &Contents::Scalar(Scalar::Bool(false)),
                    &Contents::Scalar(Scalar::from("x")),
                ]
        );
        check!(fields.last().expect("s").contents().to_bytes().as_ref() == b"x");
    }

    #[test]
    fn flatten_deep_nesting() {
        let mut body = map! { "leaf" => "bottom" };
        for _ in 0..64 {
            body = map! { "n" => body };
        }

        let fields = flatten(&body).expect("flatten");
        let_assert!([field] = fields.as_slice());
        check!(field.name() == format!("n{}[leaf]", "[n]".repeat(63)));
    }

    #[test]
    fn flatten_unreadable_file_fails_with_field_name() {
        let body = map! {
            "doc" => map! { "scan" => FileRef::new(PathFile::new("/no/such/dir/scan.pdf")) },
        };

        let err = flatten(&body).expect_err("unreadable file");
        let_assert!(Error::Encoding { field, source } = err);
        check!(field == "doc[scan]");
        check!(source.kind() == std::io::ErrorKind::NotFound);
    }

    #[test]
    fn flatten_does_not_mutate_body() {
        let body = map! { "a" => map! { "b" => 1 } };
        let before = body.clone();
        let _ = flatten(&body).expect("flatten");
        check!(body == before);
    }

    #[test]
    fn encode_passes_through_non_multipart() {
        let body = map! { "x" => 1 };

        check!(encode(Some(&body), Format::Query).expect("query") == Payload::Query(Some(body.clone())));
        check!(
            encode(Some(&body), Format::FormParams).expect("form")
                == Payload::FormParams(Some(body.clone()))
        );
        check!(encode(Some(&body), Format::Json).expect("json") == Payload::Json(Some(body.clone())));
        check!(encode(None, Format::Json).expect("json") == Payload::Json(None));
        check!(encode(Some(&Map::new()), Format::Query).expect("query") == Payload::Query(Some(Map::new())));
    }

    #[test]
    fn encode_passes_files_through_non_multipart() {
        let body = map! { "doc" => FileRef::new(PathFile::new("/no/such/file.txt")) };
        let payload = encode(Some(&body), Format::Json).expect("no file read for json");
        check!(payload.as_map() == Some(&body));
    }

    #[test]
    fn encode_multipart() {
        let body = map! { "a" => map! { "b" => "c" } };
        let payload = encode(Some(&body), Format::Multipart).expect("multipart");

        check!(payload.key() == "multipart");
        let fields = payload.fields().map(<[FieldRecord]>::to_vec);
        check!(fields == Some(vec![FieldRecord::scalar("a[b]", "c")]));
        check!(encode(None, Format::Multipart).expect("empty") == Payload::Multipart(Vec::new()));
    }

    #[test]
    fn merge_defaults_fills_gaps_only() {
        let body = map! { "a" => 9 };
        let defaults = map! { "a" => 1, "b" => 2 };

        let merged = merge_defaults(Some(&body), &defaults);
        check!(merged == map! { "a" => 9, "b" => 2 });
        check!(body == map! { "a" => 9 });
    }

    #[test]
    fn merge_defaults_without_body() {
        let defaults = map! { "page" => 1 };
        check!(merge_defaults(None, &defaults) == defaults);
    }

    #[test]
    fn query_pairs_naming_and_scalars() {
        let body = map! {
            "q" => "rust lang",
            "filter" => map! { "active" => true, "archived" => false, "owner" => Value::NULL },
            "ids" => map! { 0 => 4, 1 => 5 },
        };

        let pairs = query_pairs(&body).expect("pairs");
        let expected: Vec<(String, String)> = [
            ("q", "rust lang"),
            ("filter[active]", "1"),
            ("filter[archived]", "0"),
            ("ids[0]", "4"),
            ("ids[1]", "5"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        check!(pairs == expected);
    }

    #[test]
    fn query_pairs_rejects_files() {
        let body = map! { "upload" => FileRef::memory("a.txt", "a") };
        let err = query_pairs(&body).expect_err("file in query");
        check!(err.to_string().contains("upload"));
    }
}
