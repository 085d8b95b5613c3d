use sea_orm::entity::prelude::*;

/// Declared default for a template placeholder, applied after caller-supplied
/// variables during rendering.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "email_template_variable")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub template_id: String,
    pub name: String,
    pub default_value: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::email_template::Entity",
        from = "Column::TemplateId",
        to = "super::email_template::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    EmailTemplate,
}

impl Related<super::email_template::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EmailTemplate.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
