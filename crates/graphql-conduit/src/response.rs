//! Request outcomes and the JSON-compatible error objects they carry.

use apollo_compiler::parser::SourceMap;
use apollo_compiler::parser::SourceSpan;
use apollo_compiler::validation::DiagnosticList;
use apollo_compiler::Name;
use serde::Deserialize;
use serde::Serialize;

/// A one-based position in a request or schema source.
pub use apollo_compiler::parser::LineColumn;

/// A JSON-compatible value. Request variables, resolver inputs and outputs,
/// and response data all use this representation.
pub type JsonValue = serde_json_bytes::Value;

/// A JSON-compatible object, in insertion order.
pub type JsonMap = serde_json_bytes::Map<serde_json_bytes::ByteString, JsonValue>;

/// One step of the response path at which a field error occurred.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// The response key of a field.
    Field(Name),
    /// An index into a list value.
    ListIndex(usize),
}

/// A GraphQL-spec error object.
///
/// Serializes to the usual `{"message", "locations", "path"}` shape, with
/// empty members omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub locations: Vec<LineColumn>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub path: Vec<PathSegment>,
}

impl Diagnostic {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: Vec::new(),
        }
    }

    /// An error pointing at a document or schema location, when one is known.
    pub(crate) fn at(
        message: impl Into<String>,
        location: Option<SourceSpan>,
        sources: &SourceMap,
    ) -> Self {
        Self {
            message: message.into(),
            locations: location
                .and_then(|span| span.line_column(sources))
                .into_iter()
                .collect(),
            path: Vec::new(),
        }
    }

    pub(crate) fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    /// Converts parser or validator diagnostics to response errors.
    pub(crate) fn from_list(list: &DiagnosticList) -> Vec<Self> {
        list.iter()
            .map(|diagnostic| Self {
                message: diagnostic.error.to_string(),
                locations: diagnostic
                    .line_column_range()
                    .map(|range| range.start)
                    .into_iter()
                    .collect(),
                path: Vec::new(),
            })
            .collect()
    }
}

/// The lifecycle stage that rejected a request, or the construction-time
/// category for a pipeline that could not be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Parse,
    Validation,
    Canonicalization,
    Execution,
    /// Schema analysis failed; see [`crate::SchemaError`].
    Schema,
    /// The configuration contradicts the schema; see [`crate::ConfigError`].
    Config,
}

/// A rejected request: no usable data, plus the stage that rejected it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Failure {
    #[serde(rename = "errorKind")]
    pub kind: ErrorKind,
    pub errors: Vec<Diagnostic>,
}

/// The data produced by a resolved request, with any field errors collected
/// along the way. Field errors do not make the request a failure as long as
/// the response root survived null propagation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPayload {
    pub data: JsonValue,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<Diagnostic>,
}

/// The result of one request through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Success(ExecutionPayload),
    Error(Failure),
}

impl Outcome {
    /// The response data, if the request succeeded.
    pub fn data(&self) -> Option<&JsonValue> {
        match self {
            Outcome::Success(payload) => Some(&payload.data),
            Outcome::Error(_) => None,
        }
    }

    /// Errors carried by either a success payload or a failure.
    pub fn errors(&self) -> &[Diagnostic] {
        match self {
            Outcome::Success(payload) => &payload.errors,
            Outcome::Error(failure) => &failure.errors,
        }
    }

    /// The failing stage, if the request was rejected.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Error(failure) => Some(failure.kind),
        }
    }

    pub(crate) fn failure(kind: ErrorKind, errors: Vec<Diagnostic>) -> Self {
        Outcome::Error(Failure { kind, errors })
    }
}
