//! The resolution engine: selection-set execution over per-field resolvers.

pub(crate) mod engine;
pub(crate) mod input_coercion;
mod introspection;
mod resolver;
mod result_coercion;

pub use self::resolver::FieldResolver;
pub use self::resolver::ObjectValue;
pub use self::resolver::ResolveError;
pub use self::resolver::ResolveInfo;
pub use self::resolver::ResolvedValue;
pub use self::resolver::ResolverMap;

/// Engine-wide switches, fixed at pipeline construction.
#[derive(Debug, Clone, Default)]
pub struct EngineSettings {
    /// Answer the `__schema` and `__type` meta-fields. When disabled (the
    /// default) they resolve to a field error.
    pub enable_schema_introspection: bool,
}

impl EngineSettings {
    pub fn with_schema_introspection(mut self) -> Self {
        self.enable_schema_introspection = true;
        self
    }
}
