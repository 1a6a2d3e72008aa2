//! Schema sources and one-time schema analysis.

use std::fs;
use std::path::PathBuf;

use apollo_compiler::validation::Valid;
use apollo_compiler::Schema;

use crate::error::SchemaError;
use crate::response::Diagnostic;

/// Raw schema text to analyze, by origin.
///
/// Multiple sources are merged in the order given, so later sources may
/// extend or depend on definitions from earlier ones.
#[derive(Debug, Clone)]
pub enum SchemaSource {
    /// Schema text held directly.
    Inline { text: String },
    /// Schema text read from a file at analysis time.
    File { path: PathBuf },
    /// Schema text behind a URL. Only `file://` URLs can be fetched.
    Url { url: String },
}

impl SchemaSource {
    pub fn inline(text: impl Into<String>) -> Self {
        Self::Inline { text: text.into() }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File { path: path.into() }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self::Url { url: url.into() }
    }
}

/// Loads, parses, merges and validates schema sources.
///
/// Runs exactly once per pipeline, from [`crate::PipelineConfig::build`].
pub(crate) fn analyze(sources: &[SchemaSource]) -> Result<Valid<Schema>, SchemaError> {
    if sources.is_empty() {
        return Err(SchemaError::NoSources);
    }
    let mut builder = Schema::builder();
    for (index, source) in sources.iter().enumerate() {
        match source {
            SchemaSource::Inline { text } => {
                builder = builder.parse(text, format!("schema-{index}.graphql"));
            }
            SchemaSource::File { path } => {
                let text = fs::read_to_string(path).map_err(|source| SchemaError::SourceIo {
                    path: path.clone(),
                    source,
                })?;
                builder = builder.parse(text, path);
            }
            SchemaSource::Url { url } => {
                let Some(path) = url.strip_prefix("file://") else {
                    return Err(SchemaError::UnsupportedUrl { url: url.clone() });
                };
                let path = PathBuf::from(path);
                let text = fs::read_to_string(&path).map_err(|source| SchemaError::SourceIo {
                    path: path.clone(),
                    source,
                })?;
                builder = builder.parse(text, path);
            }
        }
    }
    let schema = builder.build().map_err(|err| SchemaError::Parse {
        errors: Diagnostic::from_list(&err.errors),
    })?;
    schema.validate().map_err(|err| SchemaError::Invalid {
        errors: Diagnostic::from_list(&err.errors),
    })
}
