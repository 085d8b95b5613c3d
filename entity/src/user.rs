use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// A tenant account. Owned and administered entirely outside the send
/// pipeline's core; the core only ever reads it by id.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub email: String,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::domain::Entity")]
    Domain,
    #[sea_orm(has_many = "super::user_billing::Entity")]
    UserBilling,
    #[sea_orm(has_many = "super::email_template::Entity")]
    EmailTemplate,
}

impl Related<super::domain::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Domain.def()
    }
}

impl Related<super::user_billing::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserBilling.def()
    }
}

impl Related<super::email_template::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EmailTemplate.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
