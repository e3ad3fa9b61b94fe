//! Generation handlers: word definitions and topic vocabulary lists.

use crate::error::AppError;
use crate::extractors::JsonObject;
use crate::response::success_ok;
use crate::state::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use serde_json::{Map, Value};

/// Required string field. Only an absent key is reported with `missing`; a present key of any
/// other type, null included, is not a string.
fn required_str<'a>(body: &'a Map<String, Value>, field: &str, missing: &str) -> Result<&'a str, AppError> {
    match body.get(field) {
        None => Err(AppError::BadRequest(missing.to_string())),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(AppError::BadRequest(format!("{} must be a string", field))),
    }
}

/// Optional string field; null and blank strings count as absent.
fn optional_str<'a>(body: &'a Map<String, Value>, field: &str) -> Result<Option<&'a str>, AppError> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(AppError::BadRequest(format!("{} must be a string", field))),
    }
}

/// POST /definitions/gen: `{word, topic?}` -> generated definitions.
pub async fn generate_definitions(
    State(state): State<AppState>,
    JsonObject(body): JsonObject,
) -> Result<impl IntoResponse, AppError> {
    let word = required_str(&body, "word", "Please provide a word in the request body")?;
    let topic = optional_str(&body, "topic")?;
    tracing::info!(%word, topic = ?topic, "generate definitions");
    let result = state.generator.define_word(word, topic).await?;
    Ok(success_ok(result))
}

/// POST /vocabularies/gen: `{topic}` -> `{topic, vocabularies}`.
pub async fn generate_vocabularies(
    State(state): State<AppState>,
    JsonObject(body): JsonObject,
) -> Result<impl IntoResponse, AppError> {
    let topic = required_str(&body, "topic", "Please provide a topic in the request body")?;
    tracing::info!(%topic, "generate vocabulary list");
    let vocabularies = state.generator.list_vocabulary(topic).await?;
    Ok(success_ok(serde_json::json!({
        "topic": topic,
        "vocabularies": vocabularies,
    })))
}
