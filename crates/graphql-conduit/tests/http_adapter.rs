use bytes::Bytes;
use graphql_conduit::HttpHandler;
use graphql_conduit::JsonMap;
use graphql_conduit::JsonValue;
use graphql_conduit::Pipeline;
use graphql_conduit::PipelineConfig;
use graphql_conduit::ResolveError;
use graphql_conduit::ResolveInfo;
use graphql_conduit::ResolvedValue;
use graphql_conduit::ResolverMap;
use graphql_conduit::SchemaSource;
use http::Method;
use http::Request;
use http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

fn pipeline() -> Pipeline {
    let sdl = r#"
        type Query {
            greet(name: String!): String
            whoami: String
            boomNonNull: Int!
        }
    "#;
    PipelineConfig::new([SchemaSource::inline(sdl)])
        .query(
            ResolverMap::new()
                .field("greet", |info: &ResolveInfo| {
                    let name = info
                        .argument("name")
                        .and_then(JsonValue::as_str)
                        .unwrap_or("world");
                    Ok(ResolvedValue::leaf(format!("hello, {name}")))
                })
                .field("whoami", |info: &ResolveInfo| {
                    Ok(ResolvedValue::leaf(
                        info.environment_value("user")
                            .cloned()
                            .unwrap_or(JsonValue::Null),
                    ))
                })
                .field("boomNonNull", |_info: &ResolveInfo| {
                    Err(ResolveError::new("kaboom"))
                }),
        )
        .context_fn(|request| {
            let mut context = JsonMap::new();
            let user = request
                .headers()
                .get("x-user")
                .and_then(|value| value.to_str().ok());
            if let Some(user) = user {
                context.insert("user", JsonValue::from(user.to_string()));
            }
            context
        })
        .build()
        .expect("valid schema and configuration")
}

fn post(handler: &HttpHandler, body: &serde_json::Value) -> http::Response<Bytes> {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/graphql")
        .body(Bytes::from(serde_json::to_vec(body).unwrap()))
        .unwrap();
    handler.handle(request)
}

fn body_json(response: &http::Response<Bytes>) -> serde_json::Value {
    serde_json::from_slice(response.body()).unwrap()
}

#[test]
fn executes_post_requests() {
    let handler = pipeline().handler();
    let response = post(
        &handler,
        &json!({
            "query": r#"query($n: String!) { greet(name: $n) }"#,
            "variables": { "n": "Ada" },
        }),
    );
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json",
    );
    assert_eq!(
        body_json(&response),
        json!({ "data": { "greet": "hello, Ada" } }),
    );
}

#[test]
fn selects_the_operation_by_name() {
    let handler = pipeline().handler();
    let response = post(
        &handler,
        &json!({
            "query": "query A { a: whoami } query B { b: whoami }",
            "operationName": "B",
        }),
    );
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(&response), json!({ "data": { "b": null } }));
}

#[test]
fn non_post_methods_are_rejected() {
    let handler = pipeline().handler();
    let request = Request::builder()
        .method(Method::GET)
        .uri("/graphql?query={whoami}")
        .body(Bytes::new())
        .unwrap();
    let response = handler.handle(request);
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body = body_json(&response);
    assert!(body["errors"][0]["message"]
        .as_str()
        .unwrap()
        .contains("POST"));
}

#[test]
fn malformed_bodies_are_bad_requests() {
    let handler = pipeline().handler();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/graphql")
        .body(Bytes::from_static(b"{ not json"))
        .unwrap();
    let response = handler.handle(request);
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(&response);
    assert!(body["errors"][0]["message"]
        .as_str()
        .unwrap()
        .contains("malformed request body"));
}

#[test]
fn rejected_requests_are_bad_requests() {
    let handler = pipeline().handler();
    let response = post(&handler, &json!({ "query": "query { nonexistent }" }));
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(&response);
    assert!(body.get("data").is_none());
    assert!(!body["errors"].as_array().unwrap().is_empty());
}

#[test]
fn executed_requests_with_a_null_root_are_ok() {
    let handler = pipeline().handler();
    let response = post(&handler, &json!({ "query": "query { boomNonNull }" }));
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(&response);
    assert_eq!(body["data"], json!(null));
    assert!(body["errors"][0]["message"]
        .as_str()
        .unwrap()
        .contains("kaboom"));
}

#[test]
fn context_fn_derives_environment_entries_per_request() {
    let handler = pipeline().handler();
    let with_header = Request::builder()
        .method(Method::POST)
        .uri("/graphql")
        .header("x-user", "ada")
        .body(Bytes::from(
            serde_json::to_vec(&json!({ "query": "query { whoami }" })).unwrap(),
        ))
        .unwrap();
    let response = handler.handle(with_header);
    assert_eq!(body_json(&response), json!({ "data": { "whoami": "ada" } }));

    // No header, no derived entry
    let response = post(&handler, &json!({ "query": "query { whoami }" }));
    assert_eq!(body_json(&response), json!({ "data": { "whoami": null } }));
}
