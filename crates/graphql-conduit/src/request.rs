//! Per-request options and the request lifecycle.
//!
//! Every entry point funnels into [`run`], which walks the stages in order
//! and short-circuits into a stage-tagged failure. A fault in one stage
//! never reaches the next one, and resolvers only ever see canonicalized,
//! coerced input.

use apollo_compiler::ExecutableDocument;

use crate::canonical;
use crate::canonical::operation_kind;
use crate::execution::engine;
use crate::pipeline::PipelineInner;
use crate::response::Diagnostic;
use crate::response::ErrorKind;
use crate::response::ExecutionPayload;
use crate::response::Failure;
use crate::response::JsonMap;
use crate::response::JsonValue;
use crate::response::Outcome;

/// Options accompanying one query document through the pipeline.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub(crate) operation_name: Option<String>,
    pub(crate) variables: JsonMap,
    pub(crate) context: JsonMap,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the operation to execute from a multi-operation document.
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Binds one request variable.
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Replaces the variable map.
    pub fn variables(mut self, variables: JsonMap) -> Self {
        self.variables = variables;
        self
    }

    /// Adds one per-request environment entry, overriding pipeline-level
    /// entries with the same key.
    pub fn context_value(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Replaces the per-request environment entries.
    pub fn context(mut self, context: JsonMap) -> Self {
        self.context = context;
        self
    }
}

/// The lifecycle: parse, validate, canonicalize, resolve, format.
pub(crate) fn run(
    pipeline: &PipelineInner,
    query: &str,
    options: &RequestOptions,
    derived_context: Option<JsonMap>,
) -> Outcome {
    let schema = &pipeline.schema;
    let document = match ExecutableDocument::parse(schema, query, "request.graphql") {
        Ok(document) => document,
        Err(err) => return Outcome::failure(ErrorKind::Parse, Diagnostic::from_list(&err.errors)),
    };
    let document = match document.validate(schema) {
        Ok(document) => document,
        Err(err) => {
            return Outcome::failure(ErrorKind::Validation, Diagnostic::from_list(&err.errors))
        }
    };
    let operation = match canonical::canonicalize(
        schema,
        &document,
        options.operation_name.as_deref(),
        &options.variables,
        &pipeline.hooks,
    ) {
        Ok(operation) => operation,
        Err(errors) => return Outcome::failure(ErrorKind::Canonicalization, errors),
    };
    let Some(resolvers) = pipeline.resolvers(operation.operation_type) else {
        return Outcome::failure(
            ErrorKind::Execution,
            vec![Diagnostic::new(format!(
                "no resolvers are configured for {} operations",
                operation_kind(operation.operation_type)
            ))],
        );
    };
    let environment = merged_environment(pipeline, derived_context, options);
    let (data, errors) = engine::execute(
        schema,
        &operation,
        resolvers,
        &pipeline.settings,
        &environment,
        &pipeline.hooks,
    );
    match data {
        Some(data) => Outcome::Success(ExecutionPayload {
            data: JsonValue::Object(data),
            errors,
        }),
        // Null propagated to the response root: no usable data
        None => Outcome::Error(Failure {
            kind: ErrorKind::Execution,
            errors,
        }),
    }
}

/// Later layers win on key collision: pipeline base environment, then
/// adapter-derived context, then per-request context.
fn merged_environment(
    pipeline: &PipelineInner,
    derived_context: Option<JsonMap>,
    options: &RequestOptions,
) -> JsonMap {
    let mut environment = pipeline.environment.clone();
    if let Some(derived) = derived_context {
        environment.extend(derived);
    }
    environment.extend(options.context.clone());
    environment
}
