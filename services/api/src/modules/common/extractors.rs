use crate::{database::error::ApiError, server::controller::AppState};
use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Query, Request},
    Json,
};
use http::request::Parts;
use sea_orm::DatabaseConnection;
use serde::de::DeserializeOwned;
use validator::Validate;

/// Extracts the query string exactly as `axum::extract::Query<T>` but also
/// requires `T: Validate`, turning a failed validation into a 400 instead of
/// reaching the handler with bad data.
#[derive(Clone, Copy)]
pub struct ValidatedQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(payload) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.to_string()))?;

        payload
            .validate()
            .map_err(|err| ApiError::validation(err.to_string()))?;

        Ok(ValidatedQuery(payload))
    }
}

/// Extracts the request body as JSON exactly as `axum::Json<T>` but also
/// requires `T: Validate`.
#[derive(Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    T: Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.to_string()))?;

        payload
            .validate()
            .map_err(|err| ApiError::validation(err.to_string()))?;

        Ok(ValidatedJson(payload))
    }
}

/// Pulls the database connection out of `AppState` for handlers that only
/// need the pool, without taking the whole state as an argument.
pub struct DbConnection(pub DatabaseConnection);

impl FromRequestParts<AppState> for DbConnection {
    type Rejection = ApiError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(DbConnection(state.db.clone()))
    }
}
