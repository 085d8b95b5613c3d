use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use crate::modules::common::dto::{Pagination, PaginationMeta};

#[derive(Deserialize, Validate)]
pub struct ListEventsQuery {
    #[serde(flatten)]
    #[validate]
    pub pagination: Pagination,
    pub event_type: Option<String>,
    pub recipient_email: Option<String>,
    pub message_id: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct EventStatsQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Serialize, ToSchema)]
pub struct EventDto {
    pub id: String,
    pub message_id: String,
    pub event_type: String,
    pub recipient_email: String,
    pub sending_domain: String,
    pub subject: Option<String>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

impl From<entity::email_event::Model> for EventDto {
    fn from(model: entity::email_event::Model) -> Self {
        EventDto {
            id: model.id,
            message_id: model.message_id,
            event_type: super::service::event_type_to_str(&model.event_type).to_owned(),
            recipient_email: model.recipient_email,
            sending_domain: model.sending_domain,
            subject: model.subject,
            metadata: model.metadata,
            created_at: model.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ListEventsResponse {
    pub data: Vec<EventDto>,
    pub pagination: PaginationMeta,
}

#[derive(Serialize, ToSchema)]
pub struct MessageEventsResponse {
    pub message_id: String,
    pub recipients: std::collections::HashMap<String, Vec<EventDto>>,
}

#[derive(Serialize, ToSchema)]
pub struct EventStatsResponse {
    pub queued: i64,
    pub sent: i64,
    pub delivered: i64,
    pub opened: i64,
    pub clicked: i64,
    pub bounced: i64,
    pub complained: i64,
    pub unsubscribed: i64,
    pub failed: i64,
    pub sent_rate: String,
    pub open_rate: String,
    pub click_rate: String,
    pub bounce_rate: String,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct IngestEventRequest {
    #[validate(length(min = 1, message = "event_type is required"))]
    pub event_type: String,
    #[validate(length(min = 3, message = "recipient_email is required"))]
    pub recipient_email: String,
    pub message_id: Option<String>,
    pub metadata: Option<Value>,
}

#[derive(Serialize, ToSchema)]
pub struct IngestEventResponse {
    pub success: bool,
    pub event_id: String,
    pub message_id: String,
}
