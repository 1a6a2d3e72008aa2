//! Customization hooks: scalar codecs and executable-directive handlers.
//!
//! Hooks are registered on [`crate::PipelineConfig`] and checked against the
//! analyzed schema at construction, so a typo in a scalar or directive name
//! fails the build instead of silently never running.

use std::sync::Arc;

use apollo_compiler::schema::ExtendedType;
use apollo_compiler::validation::Valid;
use apollo_compiler::Name;
use apollo_compiler::Schema;
use indexmap::IndexMap;

use crate::error::ConfigError;
use crate::response::JsonMap;
use crate::response::JsonValue;

/// Why a codec rejected a value.
#[derive(Debug, Clone)]
pub struct CodecError {
    pub message: String,
}

impl CodecError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Translates a custom scalar between wire JSON and resolver-facing JSON.
///
/// `decode` runs on request-supplied values (variables and literal arguments)
/// before resolvers see them; `encode` runs on resolver output before it
/// enters the response. A custom scalar without a codec passes through
/// unchanged in both directions.
pub trait ScalarCodec: Send + Sync {
    fn decode(&self, value: &JsonValue) -> Result<JsonValue, CodecError>;
    fn encode(&self, value: &JsonValue) -> Result<JsonValue, CodecError>;
}

/// The selection a directive is attached to, as seen by its handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    Field { name: Name, response_key: Name },
    FragmentSpread { fragment_name: Name },
    InlineFragment { type_condition: Option<Name> },
}

/// Interprets one executable directive during canonicalization.
///
/// Returning `None` omits the selection from the canonical operation.
/// A returned `Field` projection may carry a changed response key; other
/// edits to the projection are ignored.
pub trait DirectiveHandler: Send + Sync {
    fn apply(&self, projection: Projection, arguments: &JsonMap) -> Option<Projection>;
}

/// `@skip(if:)`.
struct SkipHandler;

impl DirectiveHandler for SkipHandler {
    fn apply(&self, projection: Projection, arguments: &JsonMap) -> Option<Projection> {
        if arguments.get("if").and_then(JsonValue::as_bool) == Some(true) {
            None
        } else {
            Some(projection)
        }
    }
}

/// `@include(if:)`.
struct IncludeHandler;

impl DirectiveHandler for IncludeHandler {
    fn apply(&self, projection: Projection, arguments: &JsonMap) -> Option<Projection> {
        if arguments.get("if").and_then(JsonValue::as_bool) == Some(false) {
            None
        } else {
            Some(projection)
        }
    }
}

/// The codec and handler tables attached to a built pipeline, read-only.
pub(crate) struct HookRegistry {
    pub(crate) scalars: IndexMap<String, Arc<dyn ScalarCodec>>,
    pub(crate) directives: IndexMap<String, Arc<dyn DirectiveHandler>>,
}

impl HookRegistry {
    pub(crate) fn with_builtins() -> Self {
        let mut directives: IndexMap<String, Arc<dyn DirectiveHandler>> = IndexMap::new();
        directives.insert("skip".to_owned(), Arc::new(SkipHandler));
        directives.insert("include".to_owned(), Arc::new(IncludeHandler));
        Self {
            scalars: IndexMap::new(),
            directives,
        }
    }

    pub(crate) fn scalar(&self, name: &str) -> Option<&Arc<dyn ScalarCodec>> {
        self.scalars.get(name)
    }

    pub(crate) fn directive(&self, name: &str) -> Option<&Arc<dyn DirectiveHandler>> {
        self.directives.get(name)
    }

    /// Every registered name must be declared by the schema: codecs for
    /// custom scalars, handlers for directives.
    pub(crate) fn validate(&self, schema: &Valid<Schema>) -> Result<(), ConfigError> {
        for name in self.scalars.keys() {
            let declared = matches!(
                schema.types.get(name.as_str()),
                Some(ExtendedType::Scalar(_))
            ) && !is_built_in_scalar(name);
            if !declared {
                return Err(ConfigError::UndeclaredScalar { name: name.clone() });
            }
        }
        for name in self.directives.keys() {
            if !schema.directive_definitions.contains_key(name.as_str()) {
                return Err(ConfigError::UndeclaredDirective { name: name.clone() });
            }
        }
        Ok(())
    }
}

pub(crate) fn is_built_in_scalar(name: &str) -> bool {
    matches!(name, "Int" | "Float" | "String" | "Boolean" | "ID")
}
