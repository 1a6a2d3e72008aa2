use expect_test::expect;
use graphql_conduit::BuildError;
use graphql_conduit::ConfigError;
use graphql_conduit::CodecError;
use graphql_conduit::DirectiveHandler;
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
use graphql_conduit::SchemaError;
use graphql_conduit::SchemaSource;
use pretty_assertions::assert_eq;
use serde_json_bytes::json;

const PERSON_SDL: &str = r#"
type Person {
  id: ID!
  name: String!
}

type QueryRoot {
  person(id: ID!): Person
}

schema {
  query: QueryRoot
}
"#;

fn person_pipeline() -> Pipeline {
    PipelineConfig::new([SchemaSource::inline(PERSON_SDL)])
        .query(ResolverMap::new().field("person", |info: &ResolveInfo| {
            match info.argument("id").and_then(JsonValue::as_str) {
                Some("1") => Ok(ResolvedValue::leaf(json!({ "id": "1", "name": "Ada" }))),
                _ => Ok(ResolvedValue::null()),
            }
        }))
        .build()
        .expect("valid schema and configuration")
}

#[test]
fn executes_a_simple_request() {
    let pipeline = person_pipeline();
    let outcome = pipeline.execute(
        r#"query { person(id: "1") { name } }"#,
        RequestOptions::new(),
    );
    assert_eq!(outcome.error_kind(), None);
    assert_eq!(outcome.errors().len(), 0);
    assert_eq!(outcome.data().unwrap(), &json!({ "person": { "name": "Ada" } }));
    expect![[r#"{"status":"success","data":{"person":{"name":"Ada"}}}"#]]
        .assert_eq(&serde_json::to_string(&outcome).unwrap());
}

#[test]
fn unknown_id_resolves_to_null() {
    let pipeline = person_pipeline();
    let outcome = pipeline.execute(
        r#"query { person(id: "404") { name } }"#,
        RequestOptions::new(),
    );
    assert_eq!(outcome.data().unwrap(), &json!({ "person": null }));
}

#[test]
fn repeated_requests_are_identical() {
    let pipeline = person_pipeline();
    let query = r#"query { person(id: "1") { id name } }"#;
    let first = pipeline.execute(query, RequestOptions::new());
    let second = pipeline.execute(query, RequestOptions::new());
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap(),
    );
}

#[test]
fn later_sources_extend_earlier_definitions() {
    let extension = r#"
        extend type QueryRoot {
            greeting: String!
        }
    "#;
    let pipeline = PipelineConfig::new([
        SchemaSource::inline(PERSON_SDL),
        SchemaSource::inline(extension),
    ])
    .query(
        ResolverMap::new()
            .field("greeting", |_info: &ResolveInfo| {
                Ok(ResolvedValue::leaf("hello"))
            }),
    )
    .build()
    .expect("merged schema");
    let outcome = pipeline.execute("query { greeting }", RequestOptions::new());
    assert_eq!(outcome.data().unwrap(), &json!({ "greeting": "hello" }));
}

fn temp_schema_file(name: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("{name}-{}.graphql", std::process::id()));
    std::fs::write(&path, PERSON_SDL).expect("writable temp dir");
    path
}

#[test]
fn file_sources_are_read_at_build_time() {
    let path = temp_schema_file("conduit-file-source");
    let pipeline = PipelineConfig::new([SchemaSource::file(&path)])
        .query(ResolverMap::new())
        .build()
        .expect("schema read from file");
    let outcome = pipeline.execute("query { __typename }", RequestOptions::new());
    assert_eq!(outcome.data().unwrap(), &json!({ "__typename": "QueryRoot" }));
    std::fs::remove_file(path).ok();
}

#[test]
fn file_urls_load_like_file_paths() {
    let path = temp_schema_file("conduit-url-source");
    let url = format!("file://{}", path.display());
    let pipeline = PipelineConfig::new([SchemaSource::url(url)])
        .query(ResolverMap::new())
        .build()
        .expect("schema read from file URL");
    assert!(pipeline.validate_document("query { person(id: \"1\") { name } }").is_ok());
    std::fs::remove_file(path).ok();
}

#[test]
fn unreadable_file_source_fails_construction() {
    let path = std::env::temp_dir().join("conduit-no-such-schema.graphql");
    let result = PipelineConfig::new([SchemaSource::file(path)])
        .query(ResolverMap::new())
        .build();
    assert!(matches!(
        result,
        Err(BuildError::Schema(SchemaError::SourceIo { .. }))
    ));
}

#[test]
fn non_file_urls_fail_construction() {
    let result = PipelineConfig::new([SchemaSource::url("https://example.com/schema.graphql")])
        .query(ResolverMap::new())
        .build();
    assert!(matches!(
        result,
        Err(BuildError::Schema(SchemaError::UnsupportedUrl { .. }))
    ));
}

#[test]
fn no_sources_fails_construction() {
    let result = PipelineConfig::new(Vec::<SchemaSource>::new())
        .query(ResolverMap::new())
        .build();
    assert!(matches!(
        result,
        Err(BuildError::Schema(SchemaError::NoSources))
    ));
}

#[test]
fn schema_parse_error_fails_construction() {
    let result = PipelineConfig::new([SchemaSource::inline("type QueryRoot {")])
        .query(ResolverMap::new())
        .build();
    assert!(matches!(
        result,
        Err(BuildError::Schema(SchemaError::Parse { .. }))
    ));
}

#[test]
fn schema_validation_error_fails_construction() {
    let sdl = r#"
        type QueryRoot { broken: Missing }
        schema { query: QueryRoot }
    "#;
    let result = PipelineConfig::new([SchemaSource::inline(sdl)])
        .query(ResolverMap::new())
        .build();
    assert!(matches!(
        result,
        Err(BuildError::Schema(SchemaError::Invalid { .. }))
    ));
}

#[test]
fn schema_without_query_root_fails_construction() {
    let sdl = r#"
        type Settings { verbose: Boolean }
        schema { mutation: Settings }
    "#;
    let result = PipelineConfig::new([SchemaSource::inline(sdl)])
        .query(ResolverMap::new())
        .build();
    assert!(result.is_err());
}

#[test]
fn missing_query_resolvers_fail_construction() {
    let result = PipelineConfig::new([SchemaSource::inline(PERSON_SDL)]).build();
    assert!(matches!(
        result,
        Err(BuildError::Config(ConfigError::MissingQueryResolvers))
    ));
}

#[test]
fn mutation_resolvers_without_mutation_root_fail_construction() {
    let result = PipelineConfig::new([SchemaSource::inline(PERSON_SDL)])
        .query(ResolverMap::new())
        .mutation(ResolverMap::new())
        .build();
    assert!(matches!(
        result,
        Err(BuildError::Config(ConfigError::UnusedRootResolvers {
            kind: "mutation"
        }))
    ));
}

struct NoopCodec;

impl ScalarCodec for NoopCodec {
    fn decode(&self, value: &JsonValue) -> Result<JsonValue, CodecError> {
        Ok(value.clone())
    }

    fn encode(&self, value: &JsonValue) -> Result<JsonValue, CodecError> {
        Ok(value.clone())
    }
}

struct KeepHandler;

impl DirectiveHandler for KeepHandler {
    fn apply(&self, projection: Projection, _arguments: &JsonMap) -> Option<Projection> {
        Some(projection)
    }
}

#[test]
fn codec_for_undeclared_scalar_fails_construction() {
    let result = PipelineConfig::new([SchemaSource::inline(PERSON_SDL)])
        .query(ResolverMap::new())
        .scalar("Date", NoopCodec)
        .build();
    assert!(matches!(
        result,
        Err(BuildError::Config(ConfigError::UndeclaredScalar { .. }))
    ));
}

#[test]
fn codec_for_built_in_scalar_fails_construction() {
    let result = PipelineConfig::new([SchemaSource::inline(PERSON_SDL)])
        .query(ResolverMap::new())
        .scalar("ID", NoopCodec)
        .build();
    assert!(matches!(
        result,
        Err(BuildError::Config(ConfigError::UndeclaredScalar { .. }))
    ));
}

#[test]
fn handler_for_undeclared_directive_fails_construction() {
    let result = PipelineConfig::new([SchemaSource::inline(PERSON_SDL)])
        .query(ResolverMap::new())
        .directive("cache", KeepHandler)
        .build();
    assert!(matches!(
        result,
        Err(BuildError::Config(ConfigError::UndeclaredDirective { .. }))
    ));
}

#[test]
fn validate_document_does_not_execute() {
    let pipeline = person_pipeline();
    assert!(pipeline
        .validate_document(r#"query { person(id: "1") { name } }"#)
        .is_ok());

    let parse = pipeline.validate_document("query {").unwrap_err();
    assert_eq!(parse.kind, graphql_conduit::ErrorKind::Parse);
    assert!(!parse.errors.is_empty());

    let validation = pipeline
        .validate_document("query { nonexistent }")
        .unwrap_err();
    assert_eq!(validation.kind, graphql_conduit::ErrorKind::Validation);
}

#[test]
fn build_errors_convert_to_wire_failures() {
    let err = PipelineConfig::new([SchemaSource::inline(PERSON_SDL)])
        .build()
        .unwrap_err();
    let failure = graphql_conduit::Failure::from(err);
    assert_eq!(failure.kind, graphql_conduit::ErrorKind::Config);
    assert_eq!(
        serde_json::to_value(&failure).unwrap(),
        serde_json::json!({
            "errorKind": "config",
            "errors": [{ "message": "a query resolver map is required" }],
        }),
    );
}

#[test]
fn pipeline_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Pipeline>();
    assert_send_sync::<graphql_conduit::HttpHandler>();
}
