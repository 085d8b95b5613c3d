use chrono::Utc;
use entity::email_suppression::{self, SuppressionReason};
use sea_orm::{
    sea_query::Expr, ActiveEnum, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection,
    DbErr, EntityTrait, FromQueryResult, QueryFilter, QuerySelect, Set,
};
use serde_json::json;
use shared::ids::tracking_id;

/// Returns the subset of `emails` (already lowercased by the caller is not
/// required — this lowercases again) blocked by a suppression row scoped to
/// `user_id` and, when given, `domain_id` (rows with `domain_id IS NULL`
/// always apply regardless of the domain being sent from).
pub async fn check(
    db: &DatabaseConnection,
    user_id: &str,
    emails: &[String],
    domain_id: Option<&str>,
) -> Result<Vec<String>, DbErr> {
    if emails.is_empty() {
        return Ok(Vec::new());
    }

    let lowered: Vec<String> = emails.iter().map(|e| e.trim().to_lowercase()).collect();
    let blocking: Vec<sea_orm::Value> = SuppressionReason::BLOCKING
        .iter()
        .cloned()
        .map(|r| r.to_value())
        .collect();

    let mut condition = Condition::all()
        .add(email_suppression::Column::UserId.eq(user_id))
        .add(email_suppression::Column::Email.is_in(lowered))
        .add(email_suppression::Column::Reason.is_in(blocking));

    condition = condition.add(match domain_id {
        Some(id) => email_suppression::Column::DomainId
            .is_null()
            .or(email_suppression::Column::DomainId.eq(id)),
        None => email_suppression::Column::DomainId.is_null(),
    });

    let rows = email_suppression::Entity::find()
        .filter(condition)
        .all(db)
        .await?;

    Ok(rows.into_iter().map(|row| row.email).collect())
}

/// Inserts a suppression row, or returns the existing row unchanged if one
/// already exists for `(user_id, email)` — idempotent by design.
#[allow(clippy::too_many_arguments)]
pub async fn add(
    db: &DatabaseConnection,
    user_id: &str,
    email: &str,
    reason: SuppressionReason,
    source_event_id: Option<&str>,
    domain_id: Option<&str>,
    metadata: Option<serde_json::Value>,
) -> Result<email_suppression::Model, DbErr> {
    let email = email.trim().to_lowercase();

    if let Some(existing) = find_by_user_email(db, user_id, &email).await? {
        return Ok(existing);
    }

    let model = email_suppression::ActiveModel {
        id: Set(tracking_id()),
        created_at: Set(Utc::now()),
        user_id: Set(user_id.to_owned()),
        domain_id: Set(domain_id.map(str::to_owned)),
        email: Set(email),
        reason: Set(reason),
        source_event_id: Set(source_event_id.map(str::to_owned)),
        metadata: Set(metadata.unwrap_or_else(|| json!({}))),
    };

    model.insert(db).await
}

/// Accumulates a soft bounce against `(user_id, email)`, promoting to
/// `hard_bounce` once the running count reaches 3. Never downgrades an
/// existing non-soft-bounce row.
pub async fn handle_soft_bounce(
    db: &DatabaseConnection,
    user_id: &str,
    email: &str,
    source_event_id: Option<&str>,
) -> Result<email_suppression::Model, DbErr> {
    let email = email.trim().to_lowercase();
    let now = Utc::now();

    let Some(existing) = find_by_user_email(db, user_id, &email).await? else {
        let model = email_suppression::ActiveModel {
            id: Set(tracking_id()),
            created_at: Set(now),
            user_id: Set(user_id.to_owned()),
            domain_id: Set(None),
            email: Set(email),
            reason: Set(SuppressionReason::SoftBounce),
            source_event_id: Set(source_event_id.map(str::to_owned)),
            metadata: Set(json!({ "soft_bounce_count": 1, "first_bounce_at": now })),
        };
        return model.insert(db).await;
    };

    if existing.reason != SuppressionReason::SoftBounce {
        return Ok(existing);
    }

    let current_count = existing
        .metadata
        .get("soft_bounce_count")
        .and_then(|v| v.as_i64())
        .unwrap_or(1);
    let new_count = current_count + 1;

    let mut active: email_suppression::ActiveModel = existing.into();

    if new_count >= 3 {
        active.reason = Set(SuppressionReason::HardBounce);
        active.metadata = Set(json!({
            "soft_bounce_count": new_count,
            "upgraded_at": now,
            "upgrade_reason": "three soft bounces",
        }));
    } else {
        active.metadata = Set(json!({ "soft_bounce_count": new_count, "last_bounce_at": now }));
    }

    active.update(db).await
}

/// Deletes a suppression row iff it is owned by `user_id`.
pub async fn remove(db: &DatabaseConnection, user_id: &str, id: &str) -> Result<bool, DbErr> {
    let result = email_suppression::Entity::delete_many()
        .filter(email_suppression::Column::Id.eq(id))
        .filter(email_suppression::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}

#[derive(FromQueryResult)]
pub struct ReasonCount {
    pub reason: SuppressionReason,
    pub count: i64,
}

pub async fn stats(db: &DatabaseConnection, user_id: &str) -> Result<Vec<ReasonCount>, DbErr> {
    email_suppression::Entity::find()
        .filter(email_suppression::Column::UserId.eq(user_id))
        .select_only()
        .column(email_suppression::Column::Reason)
        .column_as(Expr::col(email_suppression::Column::Id).count(), "count")
        .group_by(email_suppression::Column::Reason)
        .into_model::<ReasonCount>()
        .all(db)
        .await
}

async fn find_by_user_email(
    db: &DatabaseConnection,
    user_id: &str,
    email: &str,
) -> Result<Option<email_suppression::Model>, DbErr> {
    email_suppression::Entity::find()
        .filter(email_suppression::Column::UserId.eq(user_id))
        .filter(email_suppression::Column::Email.eq(email))
        .one(db)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocking_set_excludes_soft_bounce() {
        assert!(!SuppressionReason::BLOCKING.contains(&SuppressionReason::SoftBounce));
        assert!(SuppressionReason::BLOCKING.contains(&SuppressionReason::HardBounce));
        assert!(SuppressionReason::BLOCKING.contains(&SuppressionReason::Complaint));
        assert!(SuppressionReason::BLOCKING.contains(&SuppressionReason::Unsubscribe));
        assert!(SuppressionReason::BLOCKING.contains(&SuppressionReason::Manual));
    }
}
