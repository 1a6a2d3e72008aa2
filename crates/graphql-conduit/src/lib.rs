#![doc = include_str!("../README.md")]

mod canonical;
pub mod error;
pub mod execution;
pub mod hooks;
pub mod http;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod source;

pub use crate::error::BuildError;
pub use crate::error::ConfigError;
pub use crate::error::SchemaError;
pub use crate::execution::EngineSettings;
pub use crate::execution::FieldResolver;
pub use crate::execution::ObjectValue;
pub use crate::execution::ResolveError;
pub use crate::execution::ResolveInfo;
pub use crate::execution::ResolvedValue;
pub use crate::execution::ResolverMap;
pub use crate::hooks::CodecError;
pub use crate::hooks::DirectiveHandler;
pub use crate::hooks::Projection;
pub use crate::hooks::ScalarCodec;
pub use crate::http::HttpHandler;
pub use crate::pipeline::Pipeline;
pub use crate::pipeline::PipelineConfig;
pub use crate::request::RequestOptions;
pub use crate::response::Diagnostic;
pub use crate::response::ErrorKind;
pub use crate::response::ExecutionPayload;
pub use crate::response::Failure;
pub use crate::response::JsonMap;
pub use crate::response::JsonValue;
pub use crate::response::Outcome;
pub use crate::source::SchemaSource;
