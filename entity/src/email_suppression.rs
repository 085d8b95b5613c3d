use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Why a recipient is blocked. Only the first four ever block a send;
/// `SoftBounce` is recorded but promotes to `HardBounce` after repeated
/// occurrences (see the suppression engine).
#[derive(
    Eq, Clone, Debug, PartialEq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(20))")]
#[serde(rename_all = "snake_case")]
pub enum SuppressionReason {
    #[sea_orm(string_value = "hard_bounce")]
    HardBounce,
    #[sea_orm(string_value = "soft_bounce")]
    SoftBounce,
    #[sea_orm(string_value = "complaint")]
    Complaint,
    #[sea_orm(string_value = "unsubscribe")]
    Unsubscribe,
    #[sea_orm(string_value = "manual")]
    Manual,
}

impl SuppressionReason {
    /// Reasons that block future sends. `SoftBounce` is deliberately absent.
    pub const BLOCKING: &'static [SuppressionReason] = &[
        SuppressionReason::HardBounce,
        SuppressionReason::Complaint,
        SuppressionReason::Unsubscribe,
        SuppressionReason::Manual,
    ];

    pub fn is_blocking(&self) -> bool {
        Self::BLOCKING.contains(self)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "email_suppression")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
    pub domain_id: Option<String>,
    pub email: String,
    pub reason: SuppressionReason,
    pub source_event_id: Option<String>,
    #[sea_orm(column_type = "Json")]
    pub metadata: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::domain::Entity",
        from = "Column::DomainId",
        to = "super::domain::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Domain,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::domain::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Domain.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
