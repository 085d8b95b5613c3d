use super::AuthContext;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::server::controller::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

#[derive(Serialize, ToSchema)]
pub struct MeResponse {
    pub user_id: String,
    pub email: String,
    pub domain: String,
    pub domain_verified: bool,
    pub api_key_name: String,
    pub email_limit: Option<i64>,
    pub email_used: Option<i64>,
}

/// Echoes the identity resolved from the bearer key
#[utoipa::path(
    get,
    tag = "auth",
    path = "/api/v1/me",
    security(("api_key" = [])),
    responses((status = OK, body = MeResponse)),
)]
pub async fn me(auth: AuthContext) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: auth.user.id,
        email: auth.user.email,
        domain: auth.domain.name,
        domain_verified: auth.domain.txt_verified,
        api_key_name: auth.api_key.name,
        email_limit: auth.billing.as_ref().map(|b| b.email_limit),
        email_used: auth.billing.as_ref().map(|b| b.email_used),
    })
}
