use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// A reusable subject/body pair with `{{var}}` placeholders. Resolution in
/// the renderer tries `id` first, then `slug`, scoped to `user_id`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "email_template")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
    pub slug: String,
    pub subject: String,
    pub html_content: String,
    pub is_active: bool,
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
    #[sea_orm(has_many = "super::email_template_variable::Entity")]
    EmailTemplateVariable,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::email_template_variable::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EmailTemplateVariable.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
