//! Errors reported while building a pipeline.
//!
//! Once construction succeeds these types are out of the picture: every
//! per-request fault is reported through [`crate::response::Outcome`]
//! instead of a Rust-level error.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::response::Diagnostic;
use crate::response::ErrorKind;
use crate::response::Failure;

/// Schema analysis failed: a source could not be loaded, parsed or validated.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("no schema sources were provided")]
    NoSources,
    #[error("failed to read schema source {}: {source}", .path.display())]
    SourceIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unsupported schema source URL {url:?}: only file:// URLs can be fetched")]
    UnsupportedUrl { url: String },
    #[error("schema parsing failed:\n{}", render(.errors))]
    Parse { errors: Vec<Diagnostic> },
    #[error("schema validation failed:\n{}", render(.errors))]
    Invalid { errors: Vec<Diagnostic> },
}

/// The pipeline configuration contradicts the analyzed schema.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("the schema declares no query root type")]
    NoQueryRootType,
    #[error("a query resolver map is required")]
    MissingQueryResolvers,
    #[error("{kind} resolvers were supplied but the schema declares no {kind} root type")]
    UnusedRootResolvers { kind: &'static str },
    #[error("a codec was registered for {name:?}, which the schema does not declare as a custom scalar")]
    UndeclaredScalar { name: String },
    #[error("a handler was registered for directive {name:?}, which the schema does not declare")]
    UndeclaredDirective { name: String },
}

/// Any construction-time failure.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Construction failures in the same wire shape as per-request failures,
/// for callers that report them to clients or logs as JSON.
impl From<BuildError> for Failure {
    fn from(error: BuildError) -> Self {
        match error {
            BuildError::Schema(SchemaError::Parse { errors })
            | BuildError::Schema(SchemaError::Invalid { errors }) => Failure {
                kind: ErrorKind::Schema,
                errors,
            },
            BuildError::Schema(other) => Failure {
                kind: ErrorKind::Schema,
                errors: vec![Diagnostic::new(other.to_string())],
            },
            BuildError::Config(other) => Failure {
                kind: ErrorKind::Config,
                errors: vec![Diagnostic::new(other.to_string())],
            },
        }
    }
}

fn render(errors: &[Diagnostic]) -> String {
    errors
        .iter()
        .map(|error| error.message.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
