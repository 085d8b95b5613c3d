use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::collections::HashMap;

use super::{dto::*, service};
use crate::{
    database::error::ApiError,
    modules::{
        auth::AuthContext,
        common::{
            error_codes::MESSAGE_NOT_FOUND,
            extractors::{ValidatedJson, ValidatedQuery},
        },
    },
    server::controller::AppState,
};

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/events", get(list).post(ingest))
        .route("/events/stats", get(stats))
        .route("/events/:message_id", get(by_message))
}

#[utoipa::path(
    get,
    tag = "events",
    path = "/api/v1/events",
    security(("api_key" = [])),
    responses((status = OK, body = ListEventsResponse)),
)]
pub async fn list(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidatedQuery(query): ValidatedQuery<ListEventsQuery>,
) -> Result<Json<ListEventsResponse>, ApiError> {
    let (rows, total) = service::list(&state.db, &auth.user.id, &query).await?;

    Ok(Json(ListEventsResponse {
        data: rows.into_iter().map(EventDto::from).collect(),
        pagination: query.pagination.meta(total),
    }))
}

#[utoipa::path(
    get,
    tag = "events",
    path = "/api/v1/events/{message_id}",
    security(("api_key" = [])),
    responses((status = OK, body = MessageEventsResponse)),
)]
pub async fn by_message(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(message_id): Path<String>,
) -> Result<Json<MessageEventsResponse>, ApiError> {
    let rows = service::by_message(&state.db, &auth.user.id, &message_id).await?;

    if rows.is_empty() {
        return Err(ApiError::not_found(
            MESSAGE_NOT_FOUND,
            "no events found for message id",
        ));
    }

    let mut recipients: HashMap<String, Vec<EventDto>> = HashMap::new();
    for row in rows {
        recipients
            .entry(row.recipient_email.clone())
            .or_default()
            .push(EventDto::from(row));
    }

    Ok(Json(MessageEventsResponse {
        message_id,
        recipients,
    }))
}

#[utoipa::path(
    get,
    tag = "events",
    path = "/api/v1/events/stats",
    security(("api_key" = [])),
    responses((status = OK, body = EventStatsResponse)),
)]
pub async fn stats(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<EventStatsQuery>,
) -> Result<Json<EventStatsResponse>, ApiError> {
    let response = service::stats(&state.db, &auth.user.id, &query).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    tag = "events",
    path = "/api/v1/events",
    security(("api_key" = [])),
    request_body = IngestEventRequest,
    responses((status = 201, body = IngestEventResponse)),
)]
pub async fn ingest(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidatedJson(request): ValidatedJson<IngestEventRequest>,
) -> Result<(StatusCode, Json<IngestEventResponse>), ApiError> {
    let inserted = service::ingest(&state.db, &auth, request)
        .await
        .map_err(ApiError::from)?;

    Ok((
        StatusCode::CREATED,
        Json(IngestEventResponse {
            success: true,
            event_id: inserted.id,
            message_id: inserted.message_id,
        }),
    ))
}
