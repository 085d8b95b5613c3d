use chrono::Utc;
use entity::{
    email_event::{self, EventType},
    email_suppression::SuppressionReason,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde_json::json;
use std::collections::HashMap;
use thiserror::Error;

use super::dto::{EventStatsQuery, EventStatsResponse, IngestEventRequest, ListEventsQuery};
use crate::{database::helpers::paginate, modules::auth::AuthContext, modules::suppression};

#[derive(Debug, Error)]
pub enum EventsError {
    #[error("unknown event_type: {0}")]
    UnknownEventType(String),
    #[error("database error: {0}")]
    Db(#[from] DbErr),
}

impl From<EventsError> for crate::database::error::ApiError {
    fn from(err: EventsError) -> Self {
        match err {
            EventsError::UnknownEventType(raw) => crate::database::error::ApiError::validation(
                format!("unknown event_type: {raw}"),
            ),
            EventsError::Db(err) => crate::database::error::ApiError::Db(err),
        }
    }
}

pub fn event_type_to_str(event_type: &EventType) -> &'static str {
    match event_type {
        EventType::Queued => "queued",
        EventType::Sent => "sent",
        EventType::Delivered => "delivered",
        EventType::Opened => "opened",
        EventType::Clicked => "clicked",
        EventType::Bounced => "bounced",
        EventType::Complained => "complained",
        EventType::Unsubscribed => "unsubscribed",
        EventType::Failed => "failed",
    }
}

pub fn parse_event_type(raw: &str) -> Result<EventType, EventsError> {
    match raw {
        "queued" => Ok(EventType::Queued),
        "sent" => Ok(EventType::Sent),
        "delivered" => Ok(EventType::Delivered),
        "opened" => Ok(EventType::Opened),
        "clicked" => Ok(EventType::Clicked),
        "bounced" => Ok(EventType::Bounced),
        "complained" => Ok(EventType::Complained),
        "unsubscribed" => Ok(EventType::Unsubscribed),
        "failed" => Ok(EventType::Failed),
        other => Err(EventsError::UnknownEventType(other.to_owned())),
    }
}

pub async fn list(
    db: &DatabaseConnection,
    user_id: &str,
    query: &ListEventsQuery,
) -> Result<(Vec<email_event::Model>, u64), EventsError> {
    let mut select =
        email_event::Entity::find().filter(email_event::Column::UserId.eq(user_id));

    if let Some(raw) = &query.event_type {
        select = select.filter(email_event::Column::EventType.eq(parse_event_type(raw)?));
    }
    if let Some(recipient) = &query.recipient_email {
        select = select.filter(email_event::Column::RecipientEmail.contains(recipient));
    }
    if let Some(message_id) = &query.message_id {
        select = select.filter(email_event::Column::MessageId.eq(message_id.clone()));
    }
    if let Some(start) = query.start_date {
        select = select.filter(email_event::Column::CreatedAt.gte(start));
    }
    if let Some(end) = query.end_date {
        select = select.filter(email_event::Column::CreatedAt.lte(end));
    }

    select = select.order_by_desc(email_event::Column::CreatedAt);

    paginate(select, &query.pagination, db)
        .await
        .map_err(EventsError::Db)
}

pub async fn by_message(
    db: &DatabaseConnection,
    user_id: &str,
    message_id: &str,
) -> Result<Vec<email_event::Model>, DbErr> {
    email_event::Entity::find()
        .filter(email_event::Column::UserId.eq(user_id))
        .filter(email_event::Column::MessageId.eq(message_id))
        .order_by_asc(email_event::Column::CreatedAt)
        .all(db)
        .await
}

#[derive(FromQueryResult)]
struct EventTypeCount {
    event_type: EventType,
    count: i64,
}

pub async fn stats(
    db: &DatabaseConnection,
    user_id: &str,
    query: &EventStatsQuery,
) -> Result<EventStatsResponse, DbErr> {
    let mut condition = Condition::all().add(email_event::Column::UserId.eq(user_id));
    if let Some(start) = query.start_date {
        condition = condition.add(email_event::Column::CreatedAt.gte(start));
    }
    if let Some(end) = query.end_date {
        condition = condition.add(email_event::Column::CreatedAt.lte(end));
    }

    let rows: Vec<EventTypeCount> = email_event::Entity::find()
        .filter(condition)
        .select_only()
        .column(email_event::Column::EventType)
        .column_as(sea_orm::sea_query::Expr::col(email_event::Column::Id).count(), "count")
        .group_by(email_event::Column::EventType)
        .into_model::<EventTypeCount>()
        .all(db)
        .await?;

    let mut counts: HashMap<&'static str, i64> = HashMap::new();
    for row in rows {
        counts.insert(event_type_to_str(&row.event_type), row.count);
    }

    let queued = *counts.get("queued").unwrap_or(&0);
    let sent = *counts.get("sent").unwrap_or(&0);
    let delivered = *counts.get("delivered").unwrap_or(&0);
    let opened = *counts.get("opened").unwrap_or(&0);
    let clicked = *counts.get("clicked").unwrap_or(&0);
    let bounced = *counts.get("bounced").unwrap_or(&0);
    let complained = *counts.get("complained").unwrap_or(&0);
    let unsubscribed = *counts.get("unsubscribed").unwrap_or(&0);
    let failed = *counts.get("failed").unwrap_or(&0);

    let base = queued.max(1) as f64;

    Ok(EventStatsResponse {
        queued,
        sent,
        delivered,
        opened,
        clicked,
        bounced,
        complained,
        unsubscribed,
        failed,
        sent_rate: format_rate(sent as f64, base),
        open_rate: format_rate(opened as f64, base),
        click_rate: format_rate(clicked as f64, base),
        bounce_rate: format_rate(bounced as f64, base),
    })
}

fn format_rate(count: f64, base: f64) -> String {
    format!("{:.2}", (count / base) * 100.0)
}

/// Inserts the external event row, then folds `complained`/`unsubscribed`/
/// `bounced` into the suppression list per the ingestion contract.
pub async fn ingest(
    db: &DatabaseConnection,
    auth: &AuthContext,
    request: IngestEventRequest,
) -> Result<email_event::Model, EventsError> {
    let event_type = parse_event_type(&request.event_type)?;
    let recipient_email = request.recipient_email.trim().to_lowercase();
    let message_id = request
        .message_id
        .clone()
        .unwrap_or_else(|| format!("manual_{}", shared::ids::event_id()));

    let model = email_event::ActiveModel {
        id: Set(shared::ids::event_id()),
        created_at: Set(Utc::now()),
        user_id: Set(auth.user.id.clone()),
        message_id: Set(message_id),
        event_type: Set(event_type.clone()),
        recipient_email: Set(recipient_email.clone()),
        sending_domain: Set(auth.domain.name.clone()),
        subject: Set(None),
        metadata: Set(request.metadata.clone().unwrap_or_else(|| json!({}))),
        ip_address: Set(None),
        user_agent: Set(None),
    };

    let inserted = model.insert(db).await?;

    match event_type {
        EventType::Complained => {
            suppression::service::add(
                db,
                &auth.user.id,
                &recipient_email,
                SuppressionReason::Complaint,
                Some(&inserted.id),
                None,
                None,
            )
            .await?;
        }
        EventType::Unsubscribed => {
            suppression::service::add(
                db,
                &auth.user.id,
                &recipient_email,
                SuppressionReason::Unsubscribe,
                Some(&inserted.id),
                None,
                None,
            )
            .await?;
        }
        EventType::Bounced => {
            let is_soft = request
                .metadata
                .as_ref()
                .and_then(|m| m.get("bounce_type"))
                .and_then(|v| v.as_str())
                == Some("soft_bounce");

            if is_soft {
                suppression::service::handle_soft_bounce(
                    db,
                    &auth.user.id,
                    &recipient_email,
                    Some(&inserted.id),
                )
                .await?;
            } else {
                suppression::service::add(
                    db,
                    &auth.user.id,
                    &recipient_email,
                    SuppressionReason::HardBounce,
                    Some(&inserted.id),
                    None,
                    None,
                )
                .await?;
            }
        }
        _ => {}
    }

    Ok(inserted)
}
