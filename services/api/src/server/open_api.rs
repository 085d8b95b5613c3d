use crate::modules::{auth, common, events, send, suppression};
use crate::server::controller;
use axum::{routing::get, Json, Router};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::openapi::{ContactBuilder, InfoBuilder};
use utoipa::{openapi::OpenApiBuilder, Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    components(schemas(
        common::dto::PaginationMeta,

        auth::routes::MeResponse,

        send::dto::SendRequest,
        send::dto::SendResponse,

        events::dto::EventDto,
        events::dto::ListEventsResponse,
        events::dto::MessageEventsResponse,
        events::dto::EventStatsResponse,
        events::dto::IngestEventRequest,
        events::dto::IngestEventResponse,

        suppression::dto::SuppressionDto,
        suppression::dto::ListSuppressionsResponse,
        suppression::dto::CheckSuppressionResponse,
        suppression::dto::AddSuppressionRequest,
        suppression::dto::SuppressionStatsResponse,
    )),
    paths(
        controller::health,

        auth::routes::me,

        send::routes::send,

        events::routes::list,
        events::routes::by_message,
        events::routes::stats,
        events::routes::ingest,

        suppression::routes::list,
        suppression::routes::check,
        suppression::routes::add,
        suppression::routes::remove,
        suppression::routes::stats,
    ),
    modifiers(&ApiKeySecurityScheme),
)]
struct ApiDoc;

/// Bearer API key security scheme referenced by every `security(("api_key" = []))`
/// annotation on the route handlers above.
struct ApiKeySecurityScheme;

impl Modify for ApiKeySecurityScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "Authorization",
                    "Bearer-prefixed domain API key",
                ))),
            )
        }
    }
}

/// Serves the raw OpenAPI document as JSON. The teacher's swagger-ui/rapidoc
/// binaries are dropped (no admin UI surface in this service), so the
/// document is exposed directly rather than through an embedded viewer.
pub fn create_openapi_router() -> Router<controller::AppState> {
    let builder: OpenApiBuilder = ApiDoc::openapi().into();

    let info = InfoBuilder::new()
        .title("mailgate API")
        .description(Some("Transactional email delivery service."))
        .version("0.1.0")
        .contact(Some(ContactBuilder::new().name(Some("mailgate")).build()))
        .build();

    let api_doc = builder.info(info).build();

    Router::new().route("/docs/openapi.json", get(move || openapi_json(api_doc.clone())))
}

async fn openapi_json(doc: utoipa::openapi::OpenApi) -> Json<utoipa::openapi::OpenApi> {
    Json(doc)
}
