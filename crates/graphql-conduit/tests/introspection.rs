use graphql_conduit::EngineSettings;
use graphql_conduit::ErrorKind;
use graphql_conduit::Pipeline;
use graphql_conduit::PipelineConfig;
use graphql_conduit::RequestOptions;
use graphql_conduit::ResolveInfo;
use graphql_conduit::ResolvedValue;
use graphql_conduit::ResolverMap;
use graphql_conduit::SchemaSource;
use pretty_assertions::assert_eq;

const SDL: &str = r#"
type Person {
  id: ID!
  name: String
}

type Catalog {
  tags: [String!]!
}

type Query {
  person: Person
}
"#;

fn pipeline(settings: EngineSettings) -> Pipeline {
    PipelineConfig::new([SchemaSource::inline(SDL)])
        .query(ResolverMap::new().field("person", |_info: &ResolveInfo| {
            Ok(ResolvedValue::null())
        }))
        .engine(settings)
        .build()
        .expect("valid schema and configuration")
}

#[test]
fn introspection_is_disabled_by_default() {
    let pipeline = pipeline(EngineSettings::default());
    let outcome = pipeline.execute(
        "query { __schema { queryType { name } } }",
        RequestOptions::new(),
    );
    // __schema is non-null, so the field error propagates to the root
    assert_eq!(outcome.error_kind(), Some(ErrorKind::Execution));
    assert!(outcome.errors()[0].message.contains("introspection is disabled"));
}

#[test]
fn schema_meta_field_reports_root_types() {
    let pipeline = pipeline(EngineSettings::default().with_schema_introspection());
    let outcome = pipeline.execute(
        "query { __schema { queryType { name } mutationType { name } } }",
        RequestOptions::new(),
    );
    assert_eq!(outcome.error_kind(), None);
    assert_eq!(
        serde_json::to_value(outcome.data().unwrap()).unwrap(),
        serde_json::json!({
            "__schema": {
                "queryType": { "name": "Query" },
                "mutationType": null,
            }
        }),
    );
}

#[test]
fn type_meta_field_describes_object_types() {
    let pipeline = pipeline(EngineSettings::default().with_schema_introspection());
    let outcome = pipeline.execute(
        r#"query {
            __type(name: "Person") {
                kind
                name
                fields {
                    name
                    type { kind name ofType { kind name } }
                }
            }
        }"#,
        RequestOptions::new(),
    );
    assert_eq!(outcome.error_kind(), None);
    assert_eq!(
        serde_json::to_value(outcome.data().unwrap()).unwrap(),
        serde_json::json!({
            "__type": {
                "kind": "OBJECT",
                "name": "Person",
                "fields": [
                    {
                        "name": "id",
                        "type": {
                            "kind": "NON_NULL",
                            "name": null,
                            "ofType": { "kind": "SCALAR", "name": "ID" },
                        },
                    },
                    {
                        "name": "name",
                        "type": { "kind": "SCALAR", "name": "String", "ofType": null },
                    },
                ],
            }
        }),
    );
}

#[test]
fn wrapper_types_chain_through_of_type() {
    let pipeline = pipeline(EngineSettings::default().with_schema_introspection());
    let outcome = pipeline.execute(
        r#"query {
            __type(name: "Catalog") {
                fields {
                    type {
                        kind
                        name
                        ofType {
                            kind
                            name
                            ofType {
                                kind
                                name
                                ofType { kind name }
                            }
                        }
                    }
                }
            }
        }"#,
        RequestOptions::new(),
    );
    assert_eq!(outcome.error_kind(), None);
    assert_eq!(
        serde_json::to_value(outcome.data().unwrap()).unwrap(),
        serde_json::json!({
            "__type": {
                "fields": [
                    {
                        "type": {
                            "kind": "NON_NULL",
                            "name": null,
                            "ofType": {
                                "kind": "LIST",
                                "name": null,
                                "ofType": {
                                    "kind": "NON_NULL",
                                    "name": null,
                                    "ofType": { "kind": "SCALAR", "name": "String" },
                                },
                            },
                        },
                    },
                ],
            }
        }),
    );
}

#[test]
fn unknown_type_names_resolve_to_null() {
    let pipeline = pipeline(EngineSettings::default().with_schema_introspection());
    let outcome = pipeline.execute(
        r#"query { __type(name: "Nothing") { name } }"#,
        RequestOptions::new(),
    );
    assert_eq!(outcome.error_kind(), None);
    assert_eq!(
        serde_json::to_value(outcome.data().unwrap()).unwrap(),
        serde_json::json!({ "__type": null }),
    );
}
