use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// One row per distinct (message, recipient, original URL) rewritten by the
/// tracking rewriter. Same first-touch rule as `email_tracking_open`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "email_tracking_link")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
    pub message_id: String,
    pub recipient_email: String,
    pub sending_domain: String,
    pub original_url: String,
    pub clicked_at: Option<DateTime<Utc>>,
    pub click_count: i32,
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
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
