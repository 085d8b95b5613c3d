use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// Monthly sending quota for a user. `email_used` is incremented
/// optimistically at accept time and rolled back by the worker on terminal
/// failure; both mutations are expressed as `SET col = col +/- N` so they are
/// race-free under concurrent sends.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "user_billing")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
    pub email_limit: i64,
    pub email_used: i64,
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
