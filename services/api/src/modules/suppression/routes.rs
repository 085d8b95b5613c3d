use axum::{
    extract::{Path, Query, State},
    routing::{delete, get},
    Json, Router,
};
use entity::email_suppression::{self, SuppressionReason};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;
use std::collections::HashMap;

use super::{dto::*, service};
use crate::{
    database::{error::ApiError, helpers::paginate},
    modules::{
        auth::AuthContext,
        common::{
            error_codes::SUPPRESSION_NOT_FOUND,
            extractors::{ValidatedJson, ValidatedQuery},
        },
    },
    server::controller::AppState,
};

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/suppressions", get(list).post(add))
        .route("/suppressions/check", get(check))
        .route("/suppressions/stats", get(stats))
        .route("/suppressions/:id", delete(remove))
}

#[utoipa::path(
    get,
    tag = "suppressions",
    path = "/api/v1/suppressions",
    security(("api_key" = [])),
    responses((status = OK, body = ListSuppressionsResponse)),
)]
pub async fn list(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidatedQuery(query): ValidatedQuery<ListSuppressionsQuery>,
) -> Result<Json<ListSuppressionsResponse>, ApiError> {
    let mut select = email_suppression::Entity::find()
        .filter(email_suppression::Column::UserId.eq(auth.user.id.clone()));

    if let Some(reason) = query.reason {
        select = select.filter(email_suppression::Column::Reason.eq(reason));
    }
    if let Some(email) = &query.email {
        select = select.filter(email_suppression::Column::Email.contains(email));
    }
    if let Some(domain_id) = &query.domain_id {
        select = select.filter(email_suppression::Column::DomainId.eq(domain_id.clone()));
    }

    let (rows, total) = paginate(select, &query.pagination, &state.db).await?;

    Ok(Json(ListSuppressionsResponse {
        data: rows.into_iter().map(SuppressionDto::from).collect(),
        pagination: query.pagination.meta(total),
    }))
}

#[utoipa::path(
    get,
    tag = "suppressions",
    path = "/api/v1/suppressions/check",
    security(("api_key" = [])),
    responses((status = OK, body = CheckSuppressionResponse)),
)]
pub async fn check(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<CheckSuppressionQuery>,
) -> Result<Json<CheckSuppressionResponse>, ApiError> {
    let suppressed = service::check(
        &state.db,
        &auth.user.id,
        &[query.email.clone()],
        Some(&auth.domain.id),
    )
    .await?;

    Ok(Json(CheckSuppressionResponse {
        email: query.email,
        suppressed: !suppressed.is_empty(),
    }))
}

#[utoipa::path(
    post,
    tag = "suppressions",
    path = "/api/v1/suppressions",
    security(("api_key" = [])),
    request_body = AddSuppressionRequest,
    responses((status = 201, body = SuppressionDto)),
)]
pub async fn add(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidatedJson(body): ValidatedJson<AddSuppressionRequest>,
) -> Result<(axum::http::StatusCode, Json<SuppressionDto>), ApiError> {
    let reason = parse_reason(&body.reason)?;

    let row = service::add(
        &state.db,
        &auth.user.id,
        &body.email,
        reason,
        None,
        body.domain_id.as_deref(),
        body.metadata,
    )
    .await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(SuppressionDto::from(row)),
    ))
}

#[utoipa::path(
    delete,
    tag = "suppressions",
    path = "/api/v1/suppressions/{id}",
    security(("api_key" = [])),
    responses((status = OK, body = serde_json::Value)),
)]
pub async fn remove(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = service::remove(&state.db, &auth.user.id, &id).await?;

    if !removed {
        return Err(ApiError::not_found(
            SUPPRESSION_NOT_FOUND,
            "suppression not found",
        ));
    }

    Ok(Json(json!({ "success": true })))
}

#[utoipa::path(
    get,
    tag = "suppressions",
    path = "/api/v1/suppressions/stats",
    security(("api_key" = [])),
    responses((status = OK, body = SuppressionStatsResponse)),
)]
pub async fn stats(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<SuppressionStatsResponse>, ApiError> {
    let counts = service::stats(&state.db, &auth.user.id).await?;

    let mut by_reason: HashMap<String, i64> = HashMap::new();
    let mut total = 0;
    for row in counts {
        total += row.count;
        by_reason.insert(reason_to_str(&row.reason).to_owned(), row.count);
    }

    Ok(Json(SuppressionStatsResponse { total, by_reason }))
}

fn parse_reason(raw: &str) -> Result<SuppressionReason, ApiError> {
    match raw {
        "hard_bounce" => Ok(SuppressionReason::HardBounce),
        "soft_bounce" => Ok(SuppressionReason::SoftBounce),
        "complaint" => Ok(SuppressionReason::Complaint),
        "unsubscribe" => Ok(SuppressionReason::Unsubscribe),
        "manual" => Ok(SuppressionReason::Manual),
        other => Err(crate::database::error::ApiError::Validation {
            code: crate::modules::common::error_codes::UNKNOWN_SUPPRESSION_REASON,
            message: format!("unknown suppression reason: {other}"),
        }),
    }
}
