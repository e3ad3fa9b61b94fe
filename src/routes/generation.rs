//! Generation routes.

use crate::handlers::generation::{generate_definitions, generate_vocabularies};
use crate::state::AppState;
use axum::{routing::post, Router};

pub fn generation_routes(state: AppState) -> Router {
    Router::new()
        .route("/definitions/gen", post(generate_definitions))
        .route("/vocabularies/gen", post(generate_vocabularies))
        .with_state(state)
}
