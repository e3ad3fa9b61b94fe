//! Module, topic and card handlers: create, change, delete, list by partition.

use crate::error::AppError;
use crate::extractors::JsonObject;
use crate::keys::MODULE_PARTITION;
use crate::response::{success_empty, success_page, success_record};
use crate::service::PageRequest;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use std::collections::HashMap;

pub async fn create_card(
    State(state): State<AppState>,
    JsonObject(body): JsonObject,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!("create card");
    let record = state.cards.create(body).await?;
    Ok(success_record(record))
}

pub async fn update_card(
    State(state): State<AppState>,
    Path((topic_key, card_key)): Path<(String, String)>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(%topic_key, %card_key, "change card");
    let record = state
        .cards
        .update_with(&topic_key, &card_key, || JsonObject::parse(&body))
        .await?;
    Ok(success_record(record))
}

pub async fn delete_card(
    State(state): State<AppState>,
    Path((topic_key, card_key)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(%topic_key, %card_key, "delete card");
    state.cards.delete(&topic_key, &card_key).await?;
    Ok(success_empty())
}

pub async fn list_cards(
    State(state): State<AppState>,
    Path(topic_key): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let request = PageRequest::from_query(&params)?;
    tracing::info!(%topic_key, page_size = request.page_size, "list cards");
    let page = state.cards.list_partition(&topic_key, &request).await?;
    Ok(success_page("cards", page))
}

pub async fn create_topic(
    State(state): State<AppState>,
    JsonObject(body): JsonObject,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!("create topic");
    let record = state.topics.create(body).await?;
    Ok(success_record(record))
}

pub async fn update_topic(
    State(state): State<AppState>,
    Path((module_key, topic_key)): Path<(String, String)>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(%module_key, %topic_key, "change topic");
    let record = state
        .topics
        .update_with(&module_key, &topic_key, || JsonObject::parse(&body))
        .await?;
    Ok(success_record(record))
}

pub async fn delete_topic(
    State(state): State<AppState>,
    Path((module_key, topic_key)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(%module_key, %topic_key, "delete topic");
    state.topics.delete(&module_key, &topic_key).await?;
    Ok(success_empty())
}

pub async fn list_topics(
    State(state): State<AppState>,
    Path(module_key): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let request = PageRequest::from_query(&params)?;
    tracing::info!(%module_key, page_size = request.page_size, "list topics");
    let page = state.topics.list_partition(&module_key, &request).await?;
    Ok(success_page("topics", page))
}

pub async fn create_module(
    State(state): State<AppState>,
    JsonObject(body): JsonObject,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!("create module");
    let record = state.modules.create(body).await?;
    Ok(success_record(record))
}

pub async fn update_module(
    State(state): State<AppState>,
    Path(module_key): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(%module_key, "change module");
    let record = state
        .modules
        .update_with(MODULE_PARTITION, &module_key, || JsonObject::parse(&body))
        .await?;
    Ok(success_record(record))
}

pub async fn delete_module(
    State(state): State<AppState>,
    Path(module_key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(%module_key, "delete module");
    state.modules.delete(MODULE_PARTITION, &module_key).await?;
    Ok(success_empty())
}

pub async fn list_modules(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let request = PageRequest::from_query(&params)?;
    tracing::info!(page_size = request.page_size, "list modules");
    let page = state.modules.list_partition(MODULE_PARTITION, &request).await?;
    Ok(success_page("modules", page))
}
