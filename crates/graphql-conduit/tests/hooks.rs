use graphql_conduit::CodecError;
use graphql_conduit::DirectiveHandler;
use graphql_conduit::ErrorKind;
use graphql_conduit::JsonMap;
use graphql_conduit::JsonValue;
use graphql_conduit::Pipeline;
use graphql_conduit::PipelineConfig;
use graphql_conduit::Projection;
use graphql_conduit::RequestOptions;
use graphql_conduit::ResolveInfo;
use graphql_conduit::ResolvedValue;
use graphql_conduit::ResolverMap;
use graphql_conduit::ScalarCodec;
use graphql_conduit::SchemaSource;
use pretty_assertions::assert_eq;
use serde_json_bytes::json;

/// Tags strings on the way in and out, making both directions observable.
struct TagCodec;

impl ScalarCodec for TagCodec {
    fn decode(&self, value: &JsonValue) -> Result<JsonValue, CodecError> {
        match value.as_str() {
            Some(text) => Ok(JsonValue::from(format!("decoded:{text}"))),
            None => Err(CodecError::new("Date values must be strings")),
        }
    }

    fn encode(&self, value: &JsonValue) -> Result<JsonValue, CodecError> {
        match value.as_str() {
            Some(text) => Ok(JsonValue::from(format!("encoded:{text}"))),
            None => Err(CodecError::new("Date values must be strings")),
        }
    }
}

fn date_pipeline() -> Pipeline {
    let sdl = r#"
        scalar Date

        type Query {
            echo(date: Date): Date
            today: Date
            number: Date
        }
    "#;
    PipelineConfig::new([SchemaSource::inline(sdl)])
        .query(
            ResolverMap::new()
                .field("echo", |info: &ResolveInfo| {
                    Ok(ResolvedValue::leaf(
                        info.argument("date").cloned().unwrap_or(JsonValue::Null),
                    ))
                })
                .field("today", |_info: &ResolveInfo| {
                    Ok(ResolvedValue::leaf("2024-05-01"))
                })
                .field("number", |_info: &ResolveInfo| Ok(ResolvedValue::leaf(42))),
        )
        .scalar("Date", TagCodec)
        .build()
        .expect("valid schema and configuration")
}

#[test]
fn codec_decodes_literal_arguments_and_encodes_output() {
    let pipeline = date_pipeline();
    let outcome = pipeline.execute(r#"query { echo(date: "x") }"#, RequestOptions::new());
    assert_eq!(outcome.data().unwrap(), &json!({ "echo": "encoded:decoded:x" }));
}

#[test]
fn codec_decodes_variable_arguments() {
    let pipeline = date_pipeline();
    let outcome = pipeline.execute(
        "query($d: Date) { echo(date: $d) }",
        RequestOptions::new().variable("d", "x"),
    );
    assert_eq!(outcome.data().unwrap(), &json!({ "echo": "encoded:decoded:x" }));
}

#[test]
fn codec_encode_applies_to_plain_output() {
    let pipeline = date_pipeline();
    let outcome = pipeline.execute("query { today }", RequestOptions::new());
    assert_eq!(outcome.data().unwrap(), &json!({ "today": "encoded:2024-05-01" }));
}

#[test]
fn decode_failure_rejects_the_request_at_canonicalization() {
    let pipeline = date_pipeline();
    let outcome = pipeline.execute(
        "query($d: Date) { echo(date: $d) }",
        RequestOptions::new().variable("d", 42),
    );
    assert_eq!(outcome.error_kind(), Some(ErrorKind::Canonicalization));
    assert!(outcome.errors()[0].message.contains("Date"));
}

#[test]
fn encode_failure_is_a_field_error() {
    let pipeline = date_pipeline();
    let outcome = pipeline.execute("query { number }", RequestOptions::new());
    assert_eq!(outcome.error_kind(), None);
    assert_eq!(outcome.data().unwrap(), &json!({ "number": null }));
    assert!(outcome.errors()[0].message.contains("encode"));
}

/// Keeps the field only when `reveal: true` is supplied.
struct MaskHandler;

impl DirectiveHandler for MaskHandler {
    fn apply(&self, projection: Projection, arguments: &JsonMap) -> Option<Projection> {
        if arguments.get("reveal").and_then(JsonValue::as_bool) == Some(true) {
            Some(projection)
        } else {
            None
        }
    }
}

/// Rewrites the response key of any field it is attached to.
struct AliasHandler;

impl DirectiveHandler for AliasHandler {
    fn apply(&self, projection: Projection, _arguments: &JsonMap) -> Option<Projection> {
        match projection {
            Projection::Field { name, .. } => Some(Projection::Field {
                name,
                response_key: apollo_compiler::name!("aka"),
            }),
            other => Some(other),
        }
    }
}

/// Ignores its arguments and always keeps the selection.
struct KeepHandler;

impl DirectiveHandler for KeepHandler {
    fn apply(&self, projection: Projection, _arguments: &JsonMap) -> Option<Projection> {
        Some(projection)
    }
}

fn directive_pipeline() -> Pipeline {
    let sdl = r#"
        directive @mask(reveal: Boolean! = false) on FIELD
        directive @aka on FIELD

        type Query {
            greeting: String
        }
    "#;
    PipelineConfig::new([SchemaSource::inline(sdl)])
        .query(ResolverMap::new().field("greeting", |_info: &ResolveInfo| {
            Ok(ResolvedValue::leaf("hello"))
        }))
        .directive("mask", MaskHandler)
        .directive("aka", AliasHandler)
        .build()
        .expect("valid schema and configuration")
}

#[test]
fn handlers_omit_selections_and_see_default_arguments() {
    let pipeline = directive_pipeline();
    let outcome = pipeline.execute(
        "query { hidden: greeting @mask shown: greeting @mask(reveal: true) }",
        RequestOptions::new(),
    );
    assert_eq!(outcome.data().unwrap(), &json!({ "shown": "hello" }));
}

#[test]
fn handlers_can_rename_the_response_key() {
    let pipeline = directive_pipeline();
    let outcome = pipeline.execute("query { greeting @aka }", RequestOptions::new());
    assert_eq!(outcome.data().unwrap(), &json!({ "aka": "hello" }));
}

#[test]
fn registered_handlers_replace_the_built_in_ones() {
    let sdl = r#"
        type Query {
            greeting: String
        }
    "#;
    let pipeline = PipelineConfig::new([SchemaSource::inline(sdl)])
        .query(ResolverMap::new().field("greeting", |_info: &ResolveInfo| {
            Ok(ResolvedValue::leaf("hello"))
        }))
        .directive("skip", KeepHandler)
        .build()
        .expect("valid schema and configuration");
    let outcome = pipeline.execute(
        "query { greeting @skip(if: true) }",
        RequestOptions::new(),
    );
    assert_eq!(outcome.data().unwrap(), &json!({ "greeting": "hello" }));
}

#[test]
fn unhandled_declared_directives_pass_through() {
    let sdl = r#"
        directive @traced on FIELD

        type Query {
            greeting: String
        }
    "#;
    let pipeline = PipelineConfig::new([SchemaSource::inline(sdl)])
        .query(ResolverMap::new().field("greeting", |_info: &ResolveInfo| {
            Ok(ResolvedValue::leaf("hello"))
        }))
        .build()
        .expect("valid schema and configuration");
    let outcome = pipeline.execute("query { greeting @traced }", RequestOptions::new());
    assert_eq!(outcome.data().unwrap(), &json!({ "greeting": "hello" }));
}
