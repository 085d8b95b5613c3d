use crate::{
    database::error::ApiError,
    modules::common::error_codes::{
        DOMAIN_NOT_VERIFIED, EMPTY_API_KEY, INVALID_API_KEY, INVALID_AUTH_FORMAT,
        MISSING_AUTH_HEADER,
    },
    server::controller::AppState,
};
use axum::extract::FromRequestParts;
use chrono::Utc;
use entity::{domain, domain_api_key, user, user_billing};
use http::{header::AUTHORIZATION, request::Parts};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use shared::ids::sha256_hex;
use tracing::warn;

const BEARER_PREFIX: &str = "Bearer ";

/// The resolved identity behind an inbound request: the API key that
/// authenticated it, the domain it's scoped to, the owning tenant, and the
/// tenant's billing row (absent for tenants with no `user_billing` row yet,
/// in which case quota is unenforced).
#[derive(Clone)]
pub struct AuthContext {
    pub api_key: domain_api_key::Model,
    pub domain: domain::Model,
    pub user: user::Model,
    pub billing: Option<user_billing::Model>,
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| ApiError::auth(MISSING_AUTH_HEADER, "Missing Authorization header"))?
            .to_str()
            .map_err(|_| ApiError::auth(INVALID_AUTH_FORMAT, "Invalid Authorization format"))?;

        let raw_key = header
            .strip_prefix(BEARER_PREFIX)
            .ok_or_else(|| ApiError::auth(INVALID_AUTH_FORMAT, "Invalid Authorization format"))?
            .trim();

        if raw_key.is_empty() {
            return Err(ApiError::auth(EMPTY_API_KEY, "API key is empty"));
        }

        let key_hash = sha256_hex(raw_key);

        let api_key = domain_api_key::Entity::find()
            .filter(domain_api_key::Column::KeyHash.eq(key_hash))
            .one(&state.db)
            .await?
            .ok_or_else(|| ApiError::auth(INVALID_API_KEY, "Invalid API key"))?;

        if !api_key.is_active {
            return Err(ApiError::auth(INVALID_API_KEY, "Invalid API key"));
        }

        let domain = domain::Entity::find_by_id(api_key.domain_id.clone())
            .one(&state.db)
            .await?
            .ok_or_else(|| ApiError::auth(INVALID_API_KEY, "Invalid API key"))?;

        if !domain.txt_verified {
            return Err(ApiError::forbidden(
                DOMAIN_NOT_VERIFIED,
                format!("domain {} has not completed TXT verification", domain.name),
            ));
        }

        let user = user::Entity::find_by_id(api_key.user_id.clone())
            .one(&state.db)
            .await?
            .ok_or_else(|| ApiError::auth(INVALID_API_KEY, "Invalid API key"))?;

        let billing = user_billing::Entity::find()
            .filter(user_billing::Column::UserId.eq(user.id.clone()))
            .one(&state.db)
            .await?;

        touch_last_used_at(state.db.clone(), api_key.id.clone());

        Ok(AuthContext {
            api_key,
            domain,
            user,
            billing,
        })
    }
}

/// Fire-and-forget update of `domain_api_key.last_used_at`. Never allowed to
/// fail the request or extend its critical path.
fn touch_last_used_at(db: DatabaseConnection, api_key_id: String) {
    tokio::spawn(async move {
        let update = domain_api_key::ActiveModel {
            id: Set(api_key_id.clone()),
            last_used_at: Set(Some(Utc::now())),
            ..Default::default()
        };

        if let Err(err) = update.update(&db).await {
            warn!(api_key_id, error = %err, "failed to update domain_api_key.last_used_at");
        }
    });
}
