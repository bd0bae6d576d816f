//! Route handlers

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info_span, warn, Instrument};

use super::state::AppState;
use crate::relay::RelayError;
use crate::types::{ErrorBody, GenerateResponse, GenerationRequest, KNOWN_MODELS};

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
        let body = ErrorBody {
            error: self.to_string(),
            kind: self.kind(),
        };
        (status, Json(body)).into_response()
    }
}

/// `POST /api/generate`
pub async fn generate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, RelayError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected request body");
        RelayError::InvalidBody(rejection.body_text())
    })?;

    let request_id = uuid::Uuid::new_v4();
    let result = state
        .relay
        .generate(&request)
        .instrument(info_span!("generate", %request_id))
        .await?;

    Ok(Json(GenerateResponse { result }))
}

/// `GET /api/models`
pub async fn models() -> impl IntoResponse {
    Json(serde_json::json!({ "models": KNOWN_MODELS }))
}
