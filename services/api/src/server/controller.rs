use super::open_api;
use crate::modules::{auth, events, send, suppression, tracking};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use shared::queue::JobQueue;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level, Span};
use utoipa::ToSchema;

/// The main application state, cloned for every request. Both fields are
/// cheap handles (a pooled connection, an `Arc`-wrapped trait object), not
/// owned resources, so cloning is free.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub queue: Arc<dyn JobQueue>,
}

/// Creates the main axum router to be served over HTTP.
pub fn new(db: DatabaseConnection, queue: Arc<dyn JobQueue>) -> Router {
    let state = AppState { db, queue };

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_origin(tower_http::cors::Any)
        .allow_headers([header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE]);

    let tracing_layer = TraceLayer::new_for_http()
        .on_request(|request: &Request<Body>, _span: &Span| {
            info!("{} {}", request.method(), request.uri().path())
        })
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let global_middlewares = ServiceBuilder::new().layer(tracing_layer).layer(cors);

    let api_v1 = Router::new()
        .merge(auth::routes::create_router())
        .merge(send::routes::create_router())
        .merge(suppression::routes::create_router())
        .merge(events::routes::create_router());

    Router::new()
        .merge(open_api::create_openapi_router())
        .route("/health", get(health))
        .nest("/api/v1", api_v1)
        .merge(tracking::routes::create_router())
        .layer(global_middlewares)
        .with_state(state)
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[utoipa::path(
    get,
    tag = "meta",
    path = "/health",
    responses((status = OK, body = HealthResponse)),
)]
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            timestamp: Utc::now(),
        }),
    )
}
