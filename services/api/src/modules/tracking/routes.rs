use crate::{
    database::error::ApiError, modules::common::error_codes::TRACKING_LINK_NOT_FOUND,
    server::controller::AppState,
};
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use entity::{email_event, email_tracking_link, email_tracking_open};
use sea_orm::{ActiveEnum, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, Statement};
use serde_json::{json, Value};
use shared::{
    ids::event_id,
    pixel::{GIF_1X1_PIXEL, GIF_CONTENT_TYPE},
};
use tracing::warn;

const MAX_IP_BYTES: usize = 45;
const MAX_USER_AGENT_BYTES: usize = 500;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/t/o/:id", get(open_pixel))
        .route("/t/c/:id", get(click_redirect))
}

/// Always serves the 1x1 GIF, even when the tracking id is unknown or the
/// database write fails — a broken pixel in a rendered email is worse than a
/// missed open event.
async fn open_pixel(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    match email_tracking_open::Entity::find_by_id(id.clone())
        .one(&state.db)
        .await
    {
        Ok(Some(tracking)) => {
            record_open(&state.db, tracking, &client_ip(&headers), &user_agent(&headers)).await
        }
        Ok(None) => warn!(tracking_id = %id, "open pixel hit for unknown tracking id"),
        Err(err) => warn!(tracking_id = %id, error = %err, "failed to look up tracking open row"),
    }

    (StatusCode::OK, no_store_headers(GIF_CONTENT_TYPE), GIF_1X1_PIXEL).into_response()
}

async fn click_redirect(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let Some(link) = email_tracking_link::Entity::find_by_id(id.clone())
        .one(&state.db)
        .await?
    else {
        return Err(ApiError::not_found(
            TRACKING_LINK_NOT_FOUND,
            "tracking link not found",
        ));
    };

    let destination = link.original_url.clone();
    record_click(&state.db, link, &client_ip(&headers), &user_agent(&headers)).await;

    Ok(Redirect::temporary(&destination).into_response())
}

async fn record_open(
    db: &DatabaseConnection,
    tracking: email_tracking_open::Model,
    ip_address: &str,
    user_agent: &str,
) {
    let result = db
        .query_one(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"update "email_tracking_open"
               set "open_count" = "open_count" + 1,
                   "opened_at" = coalesce("opened_at", $2)
               where "id" = $1
               returning "open_count""#,
            [tracking.id.clone().into(), Utc::now().into()],
        ))
        .await;

    let open_count = match result {
        Ok(row) => row.and_then(|r| r.try_get::<i32>("", "open_count").ok()),
        Err(err) => {
            warn!(tracking_id = %tracking.id, error = %err, "failed to record open");
            return;
        }
    };

    insert_first_touch_event(
        db,
        &tracking.user_id,
        &tracking.message_id,
        &tracking.recipient_email,
        &tracking.sending_domain,
        email_event::EventType::Opened,
        json!({ "tracking_id": tracking.id, "open_count": open_count }),
        ip_address,
        user_agent,
    )
    .await;
}

async fn record_click(
    db: &DatabaseConnection,
    link: email_tracking_link::Model,
    ip_address: &str,
    user_agent: &str,
) {
    let result = db
        .query_one(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"update "email_tracking_link"
               set "click_count" = "click_count" + 1,
                   "clicked_at" = coalesce("clicked_at", $2)
               where "id" = $1
               returning "click_count""#,
            [link.id.clone().into(), Utc::now().into()],
        ))
        .await;

    let click_count = match result {
        Ok(row) => row.and_then(|r| r.try_get::<i32>("", "click_count").ok()),
        Err(err) => {
            warn!(tracking_id = %link.id, error = %err, "failed to record click");
            return;
        }
    };

    insert_first_touch_event(
        db,
        &link.user_id,
        &link.message_id,
        &link.recipient_email,
        &link.sending_domain,
        email_event::EventType::Clicked,
        json!({
            "tracking_id": link.id,
            "click_count": click_count,
            "original_url": link.original_url,
        }),
        ip_address,
        user_agent,
    )
    .await;
}

/// Inserts the first `opened`/`clicked` event row for a (message, recipient)
/// pair; subsequent touches no-op against `ux_email_event_first_touch`.
#[allow(clippy::too_many_arguments)]
async fn insert_first_touch_event(
    db: &DatabaseConnection,
    user_id: &str,
    message_id: &str,
    recipient_email: &str,
    sending_domain: &str,
    event_type: email_event::EventType,
    metadata: Value,
    ip_address: &str,
    user_agent: &str,
) {
    let result = db
        .execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"insert into "email_event"
                 ("id", "created_at", "user_id", "message_id", "event_type", "recipient_email",
                  "sending_domain", "metadata", "ip_address", "user_agent")
               values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
               on conflict ("message_id", "recipient_email", "event_type")
                 where "event_type" in ('opened', 'clicked')
               do nothing"#,
            [
                event_id().into(),
                Utc::now().into(),
                user_id.into(),
                message_id.into(),
                event_type.to_value(),
                recipient_email.into(),
                sending_domain.into(),
                metadata.into(),
                ip_address.into(),
                user_agent.into(),
            ],
        ))
        .await;

    if let Err(err) = result {
        warn!(message_id, error = %err, "failed to record first-touch event");
    }
}

/// First IP from `X-Forwarded-For` else `X-Real-IP` else empty, truncated to
/// 45 bytes (the longest formatted IPv6 address).
fn client_ip(headers: &HeaderMap) -> String {
    let raw = headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    let first = raw.split(',').next().unwrap_or("").trim();
    truncate_bytes(first, MAX_IP_BYTES)
}

/// `User-Agent` header value, else empty, truncated to 500 bytes.
fn user_agent(headers: &HeaderMap) -> String {
    let raw = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    truncate_bytes(raw, MAX_USER_AGENT_BYTES)
}

fn truncate_bytes(value: &str, max_bytes: usize) -> String {
    if value.len() <= max_bytes {
        return value.to_owned();
    }

    let mut end = max_bytes;
    while !value.is_char_boundary(end) {
        end -= 1;
    }

    value[..end].to_owned()
}

fn no_store_headers(content_type: &'static str) -> [(header::HeaderName, HeaderValue); 2] {
    [
        (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
        (
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate"),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue as HV;

    #[test]
    fn client_ip_prefers_forwarded_for_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HV::from_static("203.0.113.5, 70.41.3.18"));
        headers.insert("x-real-ip", HV::from_static("1.2.3.4"));
        assert_eq!(client_ip(&headers), "203.0.113.5");
    }

    #[test]
    fn client_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HV::from_static("1.2.3.4"));
        assert_eq!(client_ip(&headers), "1.2.3.4");
    }

    #[test]
    fn client_ip_empty_when_no_headers_present() {
        assert_eq!(client_ip(&HeaderMap::new()), "");
    }

    #[test]
    fn truncate_bytes_respects_char_boundaries() {
        let value = "a".repeat(50);
        assert_eq!(truncate_bytes(&value, 10).len(), 10);
        assert_eq!(truncate_bytes("short", 10), "short");
    }
}
