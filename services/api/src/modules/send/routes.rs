use axum::{extract::State, routing::post, Json, Router};

use super::{
    dto::{SendRequest, SendResponse},
    service,
};
use crate::{
    database::error::ApiError,
    modules::{auth::AuthContext, common::extractors::ValidatedJson},
    server::controller::AppState,
};

pub fn create_router() -> Router<AppState> {
    Router::new().route("/send", post(send))
}

#[utoipa::path(
    post,
    tag = "send",
    path = "/api/v1/send",
    security(("api_key" = [])),
    request_body = SendRequest,
    responses((status = OK, body = SendResponse)),
)]
pub async fn send(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidatedJson(request): ValidatedJson<SendRequest>,
) -> Result<Json<SendResponse>, ApiError> {
    let outcome = service::accept_and_enqueue(&state.db, &state.queue, &auth, request).await?;

    Ok(Json(SendResponse {
        success: true,
        job_id: outcome.job_id,
        message_id: outcome.message_id,
        recipients: outcome.recipients,
        suppressed: outcome.suppressed,
        status: "queued",
    }))
}
