use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        let statement = r#"
        create table "user" (
            "id" varchar(255) primary key,
            "created_at" timestamptz(0) not null default now(),
            "email" varchar(255) not null,
            "name" varchar(255) not null
        );

        alter table
            "user"
        add
            constraint "user_email_unique" unique ("email");

        create table "domain" (
            "id" varchar(255) primary key,
            "created_at" timestamptz(0) not null default now(),
            "user_id" varchar(255) not null references "user" ("id") on update cascade on delete cascade,
            "name" varchar(255) not null,
            "txt_verified" boolean not null default false
        );

        alter table
            "domain"
        add
            constraint "domain_user_id_name_unique" unique ("user_id", "name");

        create table "domain_api_key" (
            "id" varchar(255) primary key,
            "created_at" timestamptz(0) not null default now(),
            "user_id" varchar(255) not null references "user" ("id") on update cascade on delete cascade,
            "domain_id" varchar(255) not null references "domain" ("id") on update cascade on delete cascade,
            "name" varchar(255) not null,
            "key_hash" varchar(64) not null,
            "is_active" boolean not null default true,
            "last_used_at" timestamptz(0) null
        );

        alter table
            "domain_api_key"
        add
            constraint "domain_api_key_key_hash_unique" unique ("key_hash");

        create table "user_billing" (
            "id" varchar(255) primary key,
            "created_at" timestamptz(0) not null default now(),
            "user_id" varchar(255) not null references "user" ("id") on update cascade on delete cascade,
            "email_limit" bigint not null default 1000,
            "email_used" bigint not null default 0
        );

        alter table
            "user_billing"
        add
            constraint "user_billing_user_id_unique" unique ("user_id");

        create table "email_template" (
            "id" varchar(255) primary key,
            "created_at" timestamptz(0) not null default now(),
            "user_id" varchar(255) not null references "user" ("id") on update cascade on delete cascade,
            "slug" varchar(255) not null,
            "subject" varchar(998) not null,
            "html_content" text not null,
            "is_active" boolean not null default true
        );

        alter table
            "email_template"
        add
            constraint "email_template_user_id_slug_unique" unique ("user_id", "slug");

        create table "email_template_variable" (
            "id" varchar(255) primary key,
            "template_id" varchar(255) not null references "email_template" ("id") on update cascade on delete cascade,
            "name" varchar(255) not null,
            "default_value" text not null
        );

        alter table
            "email_template_variable"
        add
            constraint "email_template_variable_template_id_name_unique" unique ("template_id", "name");

        create table "email_event" (
            "id" varchar(255) primary key,
            "created_at" timestamptz(0) not null default now(),
            "user_id" varchar(255) not null references "user" ("id") on update cascade on delete cascade,
            "message_id" varchar(255) not null,
            "event_type" varchar(20) not null,
            "recipient_email" varchar(255) not null,
            "sending_domain" varchar(255) not null,
            "subject" varchar(998) null,
            "metadata" jsonb not null default '{}',
            "ip_address" varchar(45) null,
            "user_agent" varchar(500) null
        );

        create index "ix_email_event_message_id" on "email_event" ("message_id");
        create index "ix_email_event_user_id_created_at" on "email_event" ("user_id", "created_at");
        create index "ix_email_event_recipient_email" on "email_event" ("recipient_email");

        create unique index "ux_email_event_first_touch" on "email_event" ("message_id", "recipient_email", "event_type")
        where "event_type" in ('opened', 'clicked');

        create table "email_tracking_open" (
            "id" varchar(255) primary key,
            "created_at" timestamptz(0) not null default now(),
            "user_id" varchar(255) not null references "user" ("id") on update cascade on delete cascade,
            "message_id" varchar(255) not null,
            "recipient_email" varchar(255) not null,
            "sending_domain" varchar(255) not null,
            "opened_at" timestamptz(0) null,
            "open_count" integer not null default 0
        );

        create index "ix_email_tracking_open_message_id" on "email_tracking_open" ("message_id");

        create table "email_tracking_link" (
            "id" varchar(255) primary key,
            "created_at" timestamptz(0) not null default now(),
            "user_id" varchar(255) not null references "user" ("id") on update cascade on delete cascade,
            "message_id" varchar(255) not null,
            "recipient_email" varchar(255) not null,
            "sending_domain" varchar(255) not null,
            "original_url" text not null,
            "clicked_at" timestamptz(0) null,
            "click_count" integer not null default 0
        );

        create index "ix_email_tracking_link_message_id" on "email_tracking_link" ("message_id");

        create table "email_suppression" (
            "id" varchar(255) primary key,
            "created_at" timestamptz(0) not null default now(),
            "user_id" varchar(255) not null references "user" ("id") on update cascade on delete cascade,
            "domain_id" varchar(255) null references "domain" ("id") on update cascade on delete cascade,
            "email" varchar(255) not null,
            "reason" varchar(20) not null,
            "source_event_id" varchar(255) null,
            "metadata" jsonb not null default '{}'
        );

        alter table
            "email_suppression"
        add
            constraint "email_suppression_user_id_email_unique" unique ("user_id", "email");

        create index "ix_email_suppression_user_id_reason" on "email_suppression" ("user_id", "reason");
        "#;

        db.execute_unprepared(statement).await?;

        Ok(())
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        Err(DbErr::Custom(String::from("cannot be reverted")))
    }
}
