use hyper::header::{AUTHORIZATION, CONTENT_TYPE};
use hyper::http::{request::Parts, HeaderValue, Response, StatusCode};
use hyper::{body, Body};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

const BEARER_PREFIX: &str = "Bearer ";

/// Failure to read a JSON request body
#[derive(Debug, Error)]
pub enum BodyError {
    /// Body could not be received
    #[error("unable to read request body")]
    Unreadable(#[from] hyper::Error),
    /// Body is not valid JSON for the expected type
    #[error("malformed request body: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Collects the body and parses it as JSON
pub async fn read_json_body<T: DeserializeOwned>(body: Body) -> Result<T, BodyError> {
    let bytes = body::to_bytes(body).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Builds a response with the given status carrying the serialized value
///
/// Falls back to a plain `500` if the value can not be serialized.
pub fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<Body> {
    match serde_json::to_vec(value) {
        Ok(data) => {
            let mut response = Response::new(Body::from(data));
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(e) => {
            let mut response = Response::new(Body::from(format!("unable to encode response: {}", e)));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}

/// Builds a `{ message }` response
pub fn message_response(status: StatusCode, message: &str) -> Response<Body> {
    json_response(status, &json!({ "message": message }))
}

/// Extracts the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod does {
    use super::*;
    use hyper::http::Request;
    use pretty_assertions::assert_eq;

    fn parts_with_authorization(value: &str) -> Parts {
        let (parts, _) = Request::builder()
            .header(AUTHORIZATION, value)
            .body(())
            .unwrap()
            .into_parts();

        parts
    }

    #[test]
    fn extract_bearer_tokens() {
        let parts = parts_with_authorization("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&parts), Some("abc.def.ghi"));
    }

    #[test]
    fn ignore_other_schemes_and_empty_tokens() {
        assert_eq!(bearer_token(&parts_with_authorization("Basic abc")), None);
        assert_eq!(bearer_token(&parts_with_authorization("Bearer ")), None);
    }

    #[tokio::test]
    async fn encode_messages_as_json() {
        let response = message_response(StatusCode::BAD_REQUEST, "Invalid type");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = body::to_bytes(response.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, json!({ "message": "Invalid type" }));
    }

    #[tokio::test]
    async fn reject_malformed_bodies() {
        let result = read_json_body::<serde_json::Value>(Body::from("{ nope")).await;
        assert!(matches!(result, Err(BodyError::Malformed(_))));
    }
}
