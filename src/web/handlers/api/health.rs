use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::web::types::{AppState, HealthResponse};

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        provider: state.service.provider_name().to_string(),
    })
}
