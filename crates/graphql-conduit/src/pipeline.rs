//! Building and sharing the request pipeline.

use std::sync::Arc;

use apollo_compiler::ast::OperationType;
use apollo_compiler::validation::Valid;
use apollo_compiler::ExecutableDocument;
use apollo_compiler::Schema;
use bytes::Bytes;
use indexmap::IndexMap;

use crate::error::BuildError;
use crate::error::ConfigError;
use crate::execution::EngineSettings;
use crate::execution::ResolverMap;
use crate::hooks::DirectiveHandler;
use crate::hooks::HookRegistry;
use crate::hooks::ScalarCodec;
use crate::http::HttpHandler;
use crate::request;
use crate::request::RequestOptions;
use crate::response::Diagnostic;
use crate::response::ErrorKind;
use crate::response::Failure;
use crate::response::JsonMap;
use crate::response::JsonValue;
use crate::response::Outcome;
use crate::source;
use crate::source::SchemaSource;

/// Derives per-request environment entries from the incoming HTTP request.
pub(crate) type ContextFn = Arc<dyn Fn(&http::Request<Bytes>) -> JsonMap + Send + Sync>;

/// Collects everything a pipeline needs, then builds it in one step.
///
/// Schema analysis runs once, in [`build`](Self::build); requests reuse the
/// analyzed schema without ever re-checking it.
pub struct PipelineConfig {
    sources: Vec<SchemaSource>,
    query: Option<ResolverMap>,
    mutation: Option<ResolverMap>,
    subscription: Option<ResolverMap>,
    settings: EngineSettings,
    environment: JsonMap,
    context_fn: Option<ContextFn>,
    scalars: IndexMap<String, Arc<dyn ScalarCodec>>,
    directives: IndexMap<String, Arc<dyn DirectiveHandler>>,
}

impl PipelineConfig {
    /// Starts a configuration from schema sources, merged in order.
    pub fn new(sources: impl IntoIterator<Item = SchemaSource>) -> Self {
        Self {
            sources: sources.into_iter().collect(),
            query: None,
            mutation: None,
            subscription: None,
            settings: EngineSettings::default(),
            environment: JsonMap::new(),
            context_fn: None,
            scalars: IndexMap::new(),
            directives: IndexMap::new(),
        }
    }

    /// Appends another schema source.
    pub fn source(mut self, source: SchemaSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Root resolvers for query operations. Required.
    pub fn query(mut self, resolvers: ResolverMap) -> Self {
        self.query = Some(resolvers);
        self
    }

    /// Root resolvers for mutation operations.
    pub fn mutation(mut self, resolvers: ResolverMap) -> Self {
        self.mutation = Some(resolvers);
        self
    }

    /// Root resolvers for subscription operations, resolved single-shot.
    pub fn subscription(mut self, resolvers: ResolverMap) -> Self {
        self.subscription = Some(resolvers);
        self
    }

    pub fn engine(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Base resolution environment, visible to every resolver.
    pub fn env(mut self, environment: JsonMap) -> Self {
        self.environment = environment;
        self
    }

    /// Adds one base environment entry.
    pub fn env_value(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    /// Derives extra environment entries from each HTTP request, for the
    /// [`HttpHandler`] surface.
    pub fn context_fn(
        mut self,
        derive: impl Fn(&http::Request<Bytes>) -> JsonMap + Send + Sync + 'static,
    ) -> Self {
        self.context_fn = Some(Arc::new(derive));
        self
    }

    /// Registers a codec for a custom scalar declared by the schema.
    pub fn scalar(mut self, name: impl Into<String>, codec: impl ScalarCodec + 'static) -> Self {
        self.scalars.insert(name.into(), Arc::new(codec));
        self
    }

    /// Registers a handler for an executable directive declared by the
    /// schema, replacing the built-in `skip`/`include` handler if named.
    pub fn directive(
        mut self,
        name: impl Into<String>,
        handler: impl DirectiveHandler + 'static,
    ) -> Self {
        self.directives.insert(name.into(), Arc::new(handler));
        self
    }

    /// Analyzes the schema and assembles an immutable [`Pipeline`].
    ///
    /// Fails when the schema does not parse or validate, when resolver maps
    /// do not line up with the schema's root types, or when a hook names a
    /// scalar or directive the schema does not declare.
    pub fn build(self) -> Result<Pipeline, BuildError> {
        let schema = source::analyze(&self.sources)?;
        if schema.root_operation(OperationType::Query).is_none() {
            return Err(ConfigError::NoQueryRootType.into());
        }
        let query = self.query.ok_or(ConfigError::MissingQueryResolvers)?;
        if self.mutation.is_some() && schema.root_operation(OperationType::Mutation).is_none() {
            return Err(ConfigError::UnusedRootResolvers { kind: "mutation" }.into());
        }
        if self.subscription.is_some()
            && schema.root_operation(OperationType::Subscription).is_none()
        {
            return Err(ConfigError::UnusedRootResolvers {
                kind: "subscription",
            }
            .into());
        }
        let mut hooks = HookRegistry::with_builtins();
        hooks.scalars.extend(self.scalars);
        hooks.directives.extend(self.directives);
        hooks.validate(&schema)?;
        Ok(Pipeline {
            inner: Arc::new(PipelineInner {
                schema,
                query,
                mutation: self.mutation,
                subscription: self.subscription,
                settings: self.settings,
                environment: self.environment,
                hooks,
                context_fn: self.context_fn,
            }),
        })
    }
}

/// An immutable, shareable request processor.
///
/// Cloning is cheap; clones share the analyzed schema and configuration.
/// Requests can run concurrently from any number of threads.
#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<PipelineInner>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").finish_non_exhaustive()
    }
}

pub(crate) struct PipelineInner {
    pub(crate) schema: Valid<Schema>,
    pub(crate) query: ResolverMap,
    pub(crate) mutation: Option<ResolverMap>,
    pub(crate) subscription: Option<ResolverMap>,
    pub(crate) settings: EngineSettings,
    pub(crate) environment: JsonMap,
    pub(crate) hooks: HookRegistry,
    pub(crate) context_fn: Option<ContextFn>,
}

impl PipelineInner {
    pub(crate) fn resolvers(&self, operation_type: OperationType) -> Option<&ResolverMap> {
        match operation_type {
            OperationType::Query => Some(&self.query),
            OperationType::Mutation => self.mutation.as_ref(),
            OperationType::Subscription => self.subscription.as_ref(),
        }
    }
}

impl Pipeline {
    /// Processes one request through the full lifecycle.
    pub fn execute(&self, query: &str, options: RequestOptions) -> Outcome {
        request::run(&self.inner, query, &options, None)
    }

    /// Parses and validates a document without executing it.
    pub fn validate_document(&self, query: &str) -> Result<(), Failure> {
        let document = ExecutableDocument::parse(&self.inner.schema, query, "request.graphql")
            .map_err(|err| Failure {
                kind: ErrorKind::Parse,
                errors: Diagnostic::from_list(&err.errors),
            })?;
        document
            .validate(&self.inner.schema)
            .map(drop)
            .map_err(|err| Failure {
                kind: ErrorKind::Validation,
                errors: Diagnostic::from_list(&err.errors),
            })
    }

    /// The HTTP adapter bound to this pipeline.
    pub fn handler(&self) -> HttpHandler {
        HttpHandler::new(self.inner.clone())
    }

    /// The analyzed schema shared by all requests.
    pub fn schema(&self) -> &Valid<Schema> {
        &self.inner.schema
    }
}
