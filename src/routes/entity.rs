//! Module, topic and card routes.

use crate::error::AppError;
use crate::handlers::entity::{
    create_card, create_module, create_topic, delete_card, delete_module, delete_topic, list_cards,
    list_modules, list_topics, update_card, update_module, update_topic,
};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use std::collections::HashMap;

/// Literal segment of the create routes; also a valid partition key (e.g. a topic titled "Create").
const CREATE_SEGMENT: &str = "create";

async fn list_cards_keyed_create(
    state: State<AppState>,
    query: Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    list_cards(state, Path(CREATE_SEGMENT.to_string()), query).await
}

async fn list_topics_keyed_create(
    state: State<AppState>,
    query: Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    list_topics(state, Path(CREATE_SEGMENT.to_string()), query).await
}

pub fn entity_routes(state: AppState) -> Router {
    Router::new()
        // The literal path wins over the parameter, so GET on it must list the "create" partition.
        .route("/cards/create", post(create_card).get(list_cards_keyed_create))
        .route("/cards/:topic_key", get(list_cards))
        .route("/cards/:topic_key/:card_key/change", put(update_card))
        .route("/cards/:topic_key/:card_key/delete", delete(delete_card))
        .route("/topics/create", post(create_topic).get(list_topics_keyed_create))
        .route("/topics/:module_key", get(list_topics))
        .route("/topics/:module_key/:topic_key/change", put(update_topic))
        .route("/topics/:module_key/:topic_key/delete", delete(delete_topic))
        .route("/modules", get(list_modules))
        .route("/modules/create", post(create_module))
        .route("/modules/:module_key/change", put(update_module))
        .route("/modules/:module_key/delete", delete(delete_module))
        .with_state(state)
}
