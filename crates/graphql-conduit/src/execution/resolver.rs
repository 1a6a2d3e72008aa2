//! The resolver surface: how field values enter the engine.

use std::fmt;
use std::sync::Arc;

use apollo_compiler::validation::Valid;
use apollo_compiler::Schema;
use indexmap::IndexMap;

use crate::response::JsonMap;
use crate::response::JsonValue;

/// A resolver declined or failed to produce a value for a field.
///
/// Surfaces in the response as a field error at the field's path, subject to
/// the usual null propagation.
#[derive(Debug, Clone)]
pub struct ResolveError {
    pub message: String,
}

impl ResolveError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub(crate) fn unknown_field(type_name: &str, field_name: &str) -> Self {
        Self::new(format!("no resolver for field {field_name} of type {type_name}"))
    }
}

/// Everything a resolver can see about the field being resolved.
pub struct ResolveInfo<'a> {
    pub(crate) schema: &'a Valid<Schema>,
    pub(crate) field_name: &'a str,
    pub(crate) arguments: &'a JsonMap,
    pub(crate) environment: &'a JsonMap,
}

impl<'a> ResolveInfo<'a> {
    /// The analyzed schema the request is executing against.
    pub fn schema(&self) -> &'a Valid<Schema> {
        self.schema
    }

    pub fn field_name(&self) -> &'a str {
        self.field_name
    }

    /// Coerced argument values for this field.
    pub fn arguments(&self) -> &'a JsonMap {
        self.arguments
    }

    pub fn argument(&self, name: &str) -> Option<&'a JsonValue> {
        self.arguments.get(name)
    }

    /// The merged resolution environment: pipeline base entries, then
    /// adapter-derived entries, then per-request context. Later wins.
    pub fn environment(&self) -> &'a JsonMap {
        self.environment
    }

    pub fn environment_value(&self, key: &str) -> Option<&'a JsonValue> {
        self.environment.get(key)
    }
}

/// A value produced by a resolver, to be completed against the field's
/// declared type.
pub enum ResolvedValue<'a> {
    /// A leaf JSON value. A JSON object or array may also stand in for a
    /// composite or list value and is unpacked during completion.
    Leaf(JsonValue),
    /// A composite value, resolved one field at a time.
    Object(Box<dyn ObjectValue + 'a>),
    /// A list of values, produced lazily.
    List(Box<dyn Iterator<Item = Result<ResolvedValue<'a>, ResolveError>> + 'a>),
}

impl<'a> ResolvedValue<'a> {
    /// Constructs a leaf value.
    pub fn leaf(json: impl Into<JsonValue>) -> Self {
        Self::Leaf(json.into())
    }

    /// Constructs a null leaf.
    pub fn null() -> Self {
        Self::Leaf(JsonValue::Null)
    }

    /// Constructs an object value.
    pub fn object(resolver: impl ObjectValue + 'a) -> Self {
        Self::Object(Box::new(resolver))
    }

    /// Constructs an object value or a null leaf.
    pub fn opt_object(opt: Option<impl ObjectValue + 'a>) -> Self {
        match opt {
            Some(resolver) => Self::object(resolver),
            None => Self::null(),
        }
    }

    /// Constructs a list value from an iterator of item values.
    pub fn list<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Self>,
        I::IntoIter: 'a,
    {
        Self::List(Box::new(iter.into_iter().map(Ok)))
    }
}

/// A composite (object-typed) value, resolved one field at a time.
///
/// Implemented by user code for nested values returned from root resolvers,
/// and internally for plain-JSON objects and schema introspection.
pub trait ObjectValue {
    /// The name of the concrete object type this value belongs to.
    ///
    /// Determines which selections apply when the field's declared type is
    /// an interface or union.
    fn type_name(&self) -> &str;

    /// Resolves one field on this value.
    fn resolve_field<'a>(
        &'a self,
        info: &'a ResolveInfo<'a>,
    ) -> Result<ResolvedValue<'a>, ResolveError>;
}

/// A root-field resolver function.
pub type FieldResolver =
    Arc<dyn for<'a> Fn(&'a ResolveInfo<'a>) -> Result<ResolvedValue<'a>, ResolveError> + Send + Sync>;

/// Named resolvers for the fields of one root operation type.
#[derive(Clone, Default)]
pub struct ResolverMap {
    fields: IndexMap<String, FieldResolver>,
}

impl ResolverMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resolver for one root field, replacing any previous one.
    pub fn field<F>(mut self, name: impl Into<String>, resolver: F) -> Self
    where
        F: for<'a> Fn(&'a ResolveInfo<'a>) -> Result<ResolvedValue<'a>, ResolveError>
            + Send
            + Sync
            + 'static,
    {
        self.fields.insert(name.into(), Arc::new(resolver));
        self
    }

    pub(crate) fn get(&self, name: &str) -> Option<&FieldResolver> {
        self.fields.get(name)
    }
}

impl fmt::Debug for ResolverMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.fields.keys()).finish()
    }
}

/// Adapts a [`ResolverMap`] to the engine's object surface, for the root of
/// the selection tree.
pub(crate) struct RootValue<'a> {
    pub(crate) type_name: &'a str,
    pub(crate) resolvers: &'a ResolverMap,
}

impl ObjectValue for RootValue<'_> {
    fn type_name(&self) -> &str {
        self.type_name
    }

    fn resolve_field<'a>(
        &'a self,
        info: &'a ResolveInfo<'a>,
    ) -> Result<ResolvedValue<'a>, ResolveError> {
        match self.resolvers.get(info.field_name()) {
            Some(resolver) => resolver(info),
            None => Err(ResolveError::unknown_field(self.type_name, info.field_name())),
        }
    }
}

/// Wraps a plain JSON object returned for a composite-typed field.
///
/// Fields resolve as key lookups; missing keys resolve to null.
pub(crate) struct JsonObject {
    pub(crate) type_name: String,
    pub(crate) fields: JsonMap,
}

impl ObjectValue for JsonObject {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn resolve_field<'a>(
        &'a self,
        info: &'a ResolveInfo<'a>,
    ) -> Result<ResolvedValue<'a>, ResolveError> {
        Ok(match self.fields.get(info.field_name()) {
            Some(value) => ResolvedValue::Leaf(value.clone()),
            None => ResolvedValue::null(),
        })
    }
}
