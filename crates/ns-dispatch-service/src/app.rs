use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;

use ns_dispatch::{BatchRequest, BatchResponse, WalkDispatcher};

use crate::registry::WorkerRegistry;

/// Shared state behind every route: the registry and the dispatcher that
/// actually runs a batch handed to `/batches`.
///
/// The service does not route individual jobs to individual registered
/// workers; it satisfies the batch request/response contract with
/// whatever `WalkDispatcher` the caller wires in (typically a
/// `LocalDispatcher`), while independently tracking worker presence for
/// the registration/heartbeat surface.
pub struct AppState {
    pub(crate) dispatcher: Arc<dyn WalkDispatcher>,
    pub(crate) registry: WorkerRegistry,
}

impl AppState {
    /// Build service state around the given dispatcher.
    pub fn new(dispatcher: Arc<dyn WalkDispatcher>) -> Self {
        Self {
            dispatcher,
            registry: WorkerRegistry::new(),
        }
    }
}

/// Build the service's `axum::Router` over the given state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/batches", post(post_batches))
        .route("/workers/register", post(post_register))
        .route("/workers/:id/heartbeat", post(post_heartbeat))
        .route("/workers/:id/unregister", post(post_unregister))
        .with_state(state)
}

#[derive(Serialize)]
struct RegisterResponse {
    worker_id: String,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

async fn post_batches(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchRequest>,
) -> Response {
    match state.dispatcher.run_batch(request.jobs).await {
        Ok(results) => Json(BatchResponse { results }).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody {
                message: err.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn post_register(State(state): State<Arc<AppState>>) -> Response {
    let worker_id = state.registry.register();
    Json(RegisterResponse { worker_id }).into_response()
}

async fn post_heartbeat(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    if state.registry.heartbeat(&id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

async fn post_unregister(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    if state.registry.unregister(&id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}
