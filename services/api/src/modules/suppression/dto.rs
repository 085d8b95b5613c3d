use entity::email_suppression::SuppressionReason;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::modules::common::dto::{Pagination, PaginationMeta};

#[derive(Deserialize, Validate)]
pub struct ListSuppressionsQuery {
    #[serde(flatten)]
    #[validate]
    pub pagination: Pagination,
    pub reason: Option<SuppressionReason>,
    pub email: Option<String>,
    pub domain_id: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SuppressionDto {
    pub id: String,
    pub email: String,
    pub reason: String,
    pub domain_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<entity::email_suppression::Model> for SuppressionDto {
    fn from(model: entity::email_suppression::Model) -> Self {
        SuppressionDto {
            id: model.id,
            email: model.email,
            reason: reason_to_str(&model.reason).to_owned(),
            domain_id: model.domain_id,
            created_at: model.created_at,
        }
    }
}

pub fn reason_to_str(reason: &SuppressionReason) -> &'static str {
    match reason {
        SuppressionReason::HardBounce => "hard_bounce",
        SuppressionReason::SoftBounce => "soft_bounce",
        SuppressionReason::Complaint => "complaint",
        SuppressionReason::Unsubscribe => "unsubscribe",
        SuppressionReason::Manual => "manual",
    }
}

#[derive(Serialize, ToSchema)]
pub struct ListSuppressionsResponse {
    pub data: Vec<SuppressionDto>,
    pub pagination: PaginationMeta,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CheckSuppressionQuery {
    pub email: String,
}

#[derive(Serialize, ToSchema)]
pub struct CheckSuppressionResponse {
    pub email: String,
    pub suppressed: bool,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct AddSuppressionRequest {
    #[validate(length(min = 3, message = "email is required"))]
    pub email: String,
    pub reason: String,
    pub domain_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Serialize, ToSchema)]
pub struct SuppressionStatsResponse {
    pub total: i64,
    pub by_reason: std::collections::HashMap<String, i64>,
}
