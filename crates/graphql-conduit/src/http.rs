//! The GraphQL-over-HTTP adapter.
//!
//! Accepts POST requests with the usual `{"query", "operationName",
//! "variables"}` JSON body. Malformed bodies and rejected requests map to
//! 400, non-POST methods to 405, and executed requests to 200 with a
//! `{"data", "errors"}` body regardless of field errors.

use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::HeaderValue;
use http::Method;
use http::Request;
use http::Response;
use http::StatusCode;
use serde::Deserialize;
use serde::Serialize;

use crate::pipeline::PipelineInner;
use crate::request;
use crate::request::RequestOptions;
use crate::response::Diagnostic;
use crate::response::ErrorKind;
use crate::response::JsonMap;
use crate::response::JsonValue;
use crate::response::Outcome;

#[derive(Deserialize)]
struct RequestBody {
    query: String,
    #[serde(default, rename = "operationName")]
    operation_name: Option<String>,
    #[serde(default)]
    variables: JsonMap,
}

#[derive(Serialize)]
struct ResponseBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<JsonValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<Diagnostic>,
}

/// Serves one pipeline over HTTP semantics. Cheap to clone.
///
/// This is transport-agnostic plumbing: callers bring their own server and
/// hand over `http::Request<Bytes>` values.
#[derive(Clone)]
pub struct HttpHandler {
    inner: Arc<PipelineInner>,
}

impl HttpHandler {
    pub(crate) fn new(inner: Arc<PipelineInner>) -> Self {
        Self { inner }
    }

    /// Processes one HTTP request. Never panics on untrusted input.
    pub fn handle(&self, request: Request<Bytes>) -> Response<Bytes> {
        if request.method() != Method::POST {
            return error_response(
                StatusCode::METHOD_NOT_ALLOWED,
                "the GraphQL endpoint only accepts POST requests",
            );
        }
        let body: RequestBody = match serde_json::from_slice(request.body()) {
            Ok(body) => body,
            Err(err) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("malformed request body: {err}"),
                )
            }
        };
        let derived_context = self.inner.context_fn.as_ref().map(|derive| derive(&request));
        let mut options = RequestOptions::new().variables(body.variables);
        if let Some(name) = body.operation_name {
            options = options.operation_name(name);
        }
        match request::run(&self.inner, &body.query, &options, derived_context) {
            Outcome::Success(payload) => json_response(
                StatusCode::OK,
                &ResponseBody {
                    data: Some(payload.data),
                    errors: payload.errors,
                },
            ),
            // An executed request is 200 even when null reached the root
            Outcome::Error(failure) if failure.kind == ErrorKind::Execution => json_response(
                StatusCode::OK,
                &ResponseBody {
                    data: Some(JsonValue::Null),
                    errors: failure.errors,
                },
            ),
            Outcome::Error(failure) => json_response(
                StatusCode::BAD_REQUEST,
                &ResponseBody {
                    data: None,
                    errors: failure.errors,
                },
            ),
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response<Bytes> {
    json_response(
        status,
        &ResponseBody {
            data: None,
            errors: vec![Diagnostic::new(message)],
        },
    )
}

fn json_response(status: StatusCode, body: &ResponseBody) -> Response<Bytes> {
    let bytes = match serde_json::to_vec(body) {
        Ok(bytes) => Bytes::from(bytes),
        Err(_) => Bytes::from_static(br#"{"errors":[{"message":"response serialization failed"}]}"#),
    };
    let mut response = Response::new(bytes);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
