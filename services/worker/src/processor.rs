use crate::mailer::Mailer;
use entity::{email_event, user_billing};
use sea_orm::{sea_query::Expr, ActiveEnum, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde_json::json;
use shared::job::SendJobPayload;
use shared::queue::Delivery;
use tracing::{error, info, warn};

/// Runs a single delivery to completion: dials the relay, transitions the
/// `queued` event rows for this message, and on the terminal attempt rolls
/// the reserved quota back.
///
/// Returns `Ok(())` when the delivery should be dropped (including on a
/// handled relay failure that isn't the last attempt — the caller re-enqueues
/// via `JobQueue::retry` based on `delivery.is_terminal_attempt()`), or `Err`
/// only for payload decode failures, which are never retried.
pub async fn process(
    delivery: &Delivery,
    db: &DatabaseConnection,
    mailer: &Mailer,
) -> Result<bool, anyhow::Error> {
    let job: SendJobPayload = delivery.decode()?;

    match mailer.send(&job).await {
        Ok(relay_response) => {
            mark_queued_rows(
                db,
                &job.message_id,
                email_event::EventType::Sent,
                json!({ "relay_response": relay_response, "accepted": job.to }),
            )
            .await?;

            info!(message_id = %job.message_id, "delivered to relay");
            Ok(true)
        }
        Err(err) => {
            warn!(message_id = %job.message_id, error = %err, "relay dispatch failed");

            if delivery.is_terminal_attempt() {
                mark_queued_rows(
                    db,
                    &job.message_id,
                    email_event::EventType::Failed,
                    json!({ "error": err.to_string(), "attempt": delivery.attempt }),
                )
                .await?;

                rollback_quota(db, &job.user_id, job.to.len() as i64).await?;
            }

            Ok(false)
        }
    }
}

async fn mark_queued_rows(
    db: &DatabaseConnection,
    message_id: &str,
    new_type: email_event::EventType,
    metadata: serde_json::Value,
) -> Result<(), anyhow::Error> {
    email_event::Entity::update_many()
        .col_expr(email_event::Column::EventType, Expr::value(new_type.to_value()))
        .col_expr(email_event::Column::Metadata, Expr::value(metadata))
        .filter(email_event::Column::MessageId.eq(message_id))
        .filter(email_event::Column::EventType.eq(email_event::EventType::Queued))
        .exec(db)
        .await?;

    Ok(())
}

async fn rollback_quota(
    db: &DatabaseConnection,
    user_id: &str,
    recipients: i64,
) -> Result<(), anyhow::Error> {
    let result = user_billing::Entity::update_many()
        .col_expr(
            user_billing::Column::EmailUsed,
            Expr::cust_with_values(
                "GREATEST(0, \"email_used\" - $1)",
                [recipients],
            ),
        )
        .filter(user_billing::Column::UserId.eq(user_id))
        .exec(db)
        .await;

    if let Err(err) = result {
        error!(user_id, error = %err, "failed to roll back quota after terminal send failure");
    }

    Ok(())
}
