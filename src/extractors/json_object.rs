//! Extract a request body that must be a JSON object.

use crate::error::AppError;
use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde_json::{Map, Value};

const NOT_AN_OBJECT: &str = "Please pass a JSON object in the request body";

/// Body as a loose field map. Empty, malformed or non-object bodies are a 400.
/// The content type is not checked; the body is parsed as JSON regardless.
#[derive(Clone, Debug)]
pub struct JsonObject(pub Map<String, Value>);

impl JsonObject {
    /// Parse raw body bytes. Handlers that must check something before looking at the body
    /// take `Bytes` and call this afterwards.
    pub fn parse(body: &[u8]) -> Result<Map<String, Value>, AppError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(AppError::BadRequest(NOT_AN_OBJECT.into()));
        }
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(AppError::BadRequest(NOT_AN_OBJECT.into())),
            Err(e) => Err(AppError::BadRequest(format!("invalid JSON body: {}", e))),
        }
    }
}

#[async_trait]
impl<S> FromRequest<S> for JsonObject
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Self::parse(&body).map(JsonObject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(result: Result<Map<String, Value>, AppError>) -> String {
        match result {
            Err(AppError::BadRequest(m)) => m,
            other => panic!("expected bad request, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_object() {
        let map = JsonObject::parse(br#"{"title": "Basics", "order": 1}"#).unwrap();
        assert_eq!(map["title"], "Basics");
        assert_eq!(map["order"], 1);
    }

    #[test]
    fn test_parse_rejects_empty_and_non_objects() {
        assert_eq!(message(JsonObject::parse(b"")), NOT_AN_OBJECT);
        assert_eq!(message(JsonObject::parse(b"  \n")), NOT_AN_OBJECT);
        assert_eq!(message(JsonObject::parse(b"[1, 2]")), NOT_AN_OBJECT);
        assert_eq!(message(JsonObject::parse(b"null")), NOT_AN_OBJECT);
        assert!(message(JsonObject::parse(b"{nope")).starts_with("invalid JSON body"));
    }
}
