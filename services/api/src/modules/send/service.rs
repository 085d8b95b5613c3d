use chrono::Utc;
use entity::{email_event, email_tracking_link, email_tracking_open};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, DatabaseConnection, DbErr, Set, TransactionTrait,
};
use serde_json::json;
use shared::{
    ids::{event_id, tracking_id},
    job::SendJobPayload,
    queue::{EnqueueOptions, JobQueue, QueueError},
};
use std::sync::Arc;
use thiserror::Error;

use super::dto::SendRequest;
use crate::{
    modules::{
        auth::AuthContext,
        suppression,
        template,
        tracking::{self, RewriteResult},
    },
    config::app_config,
};

pub struct SendOutcome {
    pub job_id: String,
    pub message_id: String,
    pub recipients: usize,
    pub suppressed: usize,
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error("{0}")]
    Validation(String),
    #[error("FROM address domain `{0}` does not match the authenticated domain `{1}`")]
    FromMismatch(String, String),
    #[error("template not found")]
    TemplateNotFound,
    #[error("monthly email limit reached. Used: {used}/{limit}")]
    QuotaExceeded { used: i64, limit: i64 },
    #[error("database error: {0}")]
    Db(#[from] DbErr),
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),
}

/// Runs the full accept-and-enqueue algorithm: validates the FROM address
/// against the tenant's domain, resolves the message body (inline or
/// template), filters suppressed recipients, persists the durable intent
/// (event rows, tracking rows, reserved quota) and enqueues the send job.
pub async fn accept_and_enqueue(
    db: &DatabaseConnection,
    queue: &Arc<dyn JobQueue>,
    auth: &AuthContext,
    request: SendRequest,
) -> Result<SendOutcome, SendError> {
    let variables = request.variables.map(|v| v.into_map()).unwrap_or_default();

    let (from_name, from_address) = parse_from_address(&request.from)
        .ok_or_else(|| SendError::Validation("from must be a valid email address".into()))?;

    let from_domain = from_address
        .rsplit('@')
        .next()
        .ok_or_else(|| SendError::Validation("from must be a valid email address".into()))?;

    if !from_domain.eq_ignore_ascii_case(&auth.domain.name) {
        return Err(SendError::FromMismatch(
            from_domain.to_owned(),
            auth.domain.name.clone(),
        ));
    }

    let to: Vec<String> = request
        .to
        .into_list()
        .into_iter()
        .map(|addr| addr.trim().to_owned())
        .collect();

    if let Some(billing) = &auth.billing {
        let projected = billing.email_used + to.len() as i64;
        if projected > billing.email_limit {
            return Err(SendError::QuotaExceeded {
                used: billing.email_used,
                limit: billing.email_limit,
            });
        }
    }

    let (subject, mut html, text) = resolve_content(db, auth, &request, &variables).await?;

    let suppressed = suppression::service::check(db, &auth.user.id, &to, Some(&auth.domain.id))
        .await
        .map_err(SendError::Db)?;

    let non_suppressed: Vec<String> = to
        .iter()
        .filter(|addr| !suppressed.contains(&addr.to_lowercase()))
        .cloned()
        .collect();

    let job_id = tracking_id();
    let message_id = format!("<{}@{}>", tracking_id(), auth.domain.name);

    let cfg = app_config();
    let rewrite = if !request.disable_tracking
        && html.is_some()
        && (cfg.enable_open_tracking || cfg.enable_click_tracking)
    {
        let result = tracking::rewrite(html.as_deref().unwrap(), &cfg.tracking_base_url);
        html = Some(result.modified_html.clone());
        Some(result)
    } else {
        None
    };

    if non_suppressed.is_empty() {
        return Ok(SendOutcome {
            job_id,
            message_id,
            recipients: 0,
            suppressed: suppressed.len(),
        });
    }

    persist_intent(
        db,
        auth,
        &message_id,
        &subject,
        &non_suppressed,
        rewrite.as_ref(),
    )
    .await?;

    reserve_quota(db, &auth.user.id, non_suppressed.len() as i64).await?;

    let payload = SendJobPayload {
        job_id: job_id.clone(),
        message_id: message_id.clone(),
        user_id: auth.user.id.clone(),
        domain_id: auth.domain.id.clone(),
        api_key_id: auth.api_key.id.clone(),
        sending_domain: auth.domain.name.clone(),
        from_name,
        from_address,
        to: non_suppressed.clone(),
        subject,
        html,
        text,
        reply_to: request.reply_to,
        headers: request.headers,
    };

    queue
        .enqueue(
            &job_id,
            serde_json::to_value(payload).expect("SendJobPayload always serializes"),
            EnqueueOptions::default(),
        )
        .await?;

    Ok(SendOutcome {
        job_id,
        message_id,
        recipients: non_suppressed.len(),
        suppressed: suppressed.len(),
    })
}

async fn resolve_content(
    db: &DatabaseConnection,
    auth: &AuthContext,
    request: &SendRequest,
    variables: &std::collections::HashMap<String, String>,
) -> Result<(String, Option<String>, Option<String>), SendError> {
    if let Some(template_id) = &request.template_id {
        let rendered = template::service::render(db, &auth.user.id, template_id, variables)
            .await?
            .ok_or(SendError::TemplateNotFound)?;

        return Ok((rendered.subject, Some(rendered.html), None));
    }

    let subject = request
        .subject
        .clone()
        .ok_or_else(|| SendError::Validation("subject is required".into()))?;

    if request.html.is_none() && request.text.is_none() {
        return Err(SendError::Validation(
            "at least one of html or text is required".into(),
        ));
    }

    Ok((subject, request.html.clone(), request.text.clone()))
}

/// Inserts the `queued` event row per recipient plus, when tracking applied,
/// one `email_tracking_open` row per recipient and the shared set of
/// `email_tracking_link` rows (created once, against the first recipient).
async fn persist_intent(
    db: &DatabaseConnection,
    auth: &AuthContext,
    message_id: &str,
    subject: &str,
    recipients: &[String],
    rewrite: Option<&RewriteResult>,
) -> Result<(), DbErr> {
    let txn = db.begin().await?;
    let now = Utc::now();

    for (index, recipient) in recipients.iter().enumerate() {
        email_event::ActiveModel {
            id: Set(event_id()),
            created_at: Set(now),
            user_id: Set(auth.user.id.clone()),
            message_id: Set(message_id.to_owned()),
            event_type: Set(email_event::EventType::Queued),
            recipient_email: Set(recipient.clone()),
            sending_domain: Set(auth.domain.name.clone()),
            subject: Set(Some(subject.to_owned())),
            metadata: Set(json!({})),
            ip_address: Set(None),
            user_agent: Set(None),
        }
        .insert(&txn)
        .await?;

        if let Some(result) = rewrite {
            let open_id = if index == 0 {
                result.open_tracking_id.clone()
            } else {
                format!("{}_{}", result.open_tracking_id, index)
            };

            email_tracking_open::ActiveModel {
                id: Set(open_id),
                created_at: Set(now),
                user_id: Set(auth.user.id.clone()),
                message_id: Set(message_id.to_owned()),
                recipient_email: Set(recipient.clone()),
                sending_domain: Set(auth.domain.name.clone()),
                opened_at: Set(None),
                open_count: Set(0),
            }
            .insert(&txn)
            .await?;

            if index == 0 {
                for link in &result.links {
                    email_tracking_link::ActiveModel {
                        id: Set(link.tracking_id.clone()),
                        created_at: Set(now),
                        user_id: Set(auth.user.id.clone()),
                        message_id: Set(message_id.to_owned()),
                        recipient_email: Set(recipient.clone()),
                        sending_domain: Set(auth.domain.name.clone()),
                        original_url: Set(link.original_url.clone()),
                        clicked_at: Set(None),
                        click_count: Set(0),
                    }
                    .insert(&txn)
                    .await?;
                }
            }
        }
    }

    txn.commit().await
}

async fn reserve_quota(db: &DatabaseConnection, user_id: &str, recipients: i64) -> Result<(), DbErr> {
    use entity::user_billing;
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

    user_billing::Entity::update_many()
        .col_expr(
            user_billing::Column::EmailUsed,
            Expr::cust_with_values("\"email_used\" + $1", [recipients]),
        )
        .filter(user_billing::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    Ok(())
}

/// Parses `local@host` or `Name <local@host>`, stripping outer quotes from
/// the name. Returns `None` if no `@` is present in the address part.
fn parse_from_address(raw: &str) -> Option<(Option<String>, String)> {
    let raw = raw.trim();

    if let Some(lt) = raw.find('<') {
        if !raw.ends_with('>') {
            return None;
        }

        let name = raw[..lt].trim().trim_matches('"').trim();
        let address = &raw[lt + 1..raw.len() - 1];

        if !address.contains('@') {
            return None;
        }

        let name = if name.is_empty() {
            None
        } else {
            Some(name.to_owned())
        };

        return Some((name, address.to_owned()));
    }

    if raw.contains('@') {
        Some((None, raw.to_owned()))
    } else {
        None
    }
}

impl From<SendError> for crate::database::error::ApiError {
    fn from(err: SendError) -> Self {
        use crate::database::error::ApiError;
        use crate::modules::common::error_codes::{FROM_ADDRESS_MISMATCH, TEMPLATE_NOT_FOUND};

        match err {
            SendError::Validation(msg) => ApiError::validation(msg),
            SendError::FromMismatch(from_domain, domain) => ApiError::forbidden(
                FROM_ADDRESS_MISMATCH,
                format!(
                    "from address domain `{from_domain}` does not match verified sending domain `{domain}`"
                ),
            ),
            SendError::TemplateNotFound => {
                ApiError::not_found(TEMPLATE_NOT_FOUND, "template not found")
            }
            SendError::QuotaExceeded { used, limit } => {
                ApiError::quota(format!("Monthly email limit reached. Used: {used}/{limit}"))
            }
            SendError::Db(err) => ApiError::Db(err),
            SendError::Queue(err) => ApiError::Queue(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse_from_address;

    #[test]
    fn parses_bare_address() {
        assert_eq!(
            parse_from_address("alice@example.com"),
            Some((None, "alice@example.com".to_owned()))
        );
    }

    #[test]
    fn parses_named_address_and_strips_quotes() {
        assert_eq!(
            parse_from_address(r#""Alice" <alice@example.com>"#),
            Some((Some("Alice".to_owned()), "alice@example.com".to_owned()))
        );
    }

    #[test]
    fn parses_named_address_without_quotes() {
        assert_eq!(
            parse_from_address("Alice <alice@example.com>"),
            Some((Some("Alice".to_owned()), "alice@example.com".to_owned()))
        );
    }

    #[test]
    fn rejects_address_without_at_sign() {
        assert_eq!(parse_from_address("not-an-email"), None);
        assert_eq!(parse_from_address("Name <not-an-email>"), None);
    }
}
