use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// A sending domain belonging to a user. `txt_verified` gates whether the
/// domain may be used as the right-hand side of a `FROM` address.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "domain")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
    pub name: String,
    pub txt_verified: bool,
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
    #[sea_orm(has_many = "super::domain_api_key::Entity")]
    DomainApiKey,
    #[sea_orm(has_many = "super::email_suppression::Entity")]
    EmailSuppression,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::domain_api_key::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DomainApiKey.def()
    }
}

impl Related<super::email_suppression::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EmailSuppression.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
