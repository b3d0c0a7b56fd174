use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    BoxError, Json, Router,
};
use std::sync::Arc;
use tower::{timeout::error::Elapsed, ServiceBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

use crate::errors::AppError;
use crate::handlers::{self, AppState};
use crate::models::{Customer, CustomerChanges, ErrorBody, FieldViolation, NewCustomer};

/// OpenAPI document generated from the handler annotations.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Customer Master API",
        description = "Customer master data management operations"
    ),
    paths(
        handlers::create_customer,
        handlers::get_customer_by_id,
        handlers::search_customers,
        handlers::update_customer,
        handlers::delete_customer,
    ),
    components(schemas(Customer, NewCustomer, CustomerChanges, ErrorBody, FieldViolation)),
    tags((name = "Customer", description = "Customer master data management operations"))
)]
pub struct ApiDoc;

/// Serves the OpenAPI document as JSON.
async fn serve_openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Serves the Swagger UI HTML page.
///
/// The page embeds Swagger UI from a CDN, configured to load the document
/// served by `serve_openapi_spec`.
async fn serve_swagger_ui() -> impl IntoResponse {
    let html = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Customer Master API - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        body { margin: 0; padding: 0; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = function() {
            window.ui = SwaggerUIBundle({
                url: "/api-docs/openapi.json",
                dom_id: '#swagger-ui',
                deepLinking: true,
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout"
            });
        };
    </script>
</body>
</html>
"#;
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
}

/// Turns middleware failures into the JSON error body.
async fn handle_middleware_error(err: BoxError) -> AppError {
    if err.is::<Elapsed>() {
        AppError::Timeout("Request took too long to complete".to_string())
    } else {
        AppError::InternalError(format!("Unhandled middleware error: {}", err))
    }
}

/// Builds the full HTTP surface: customer routes, docs, health check and
/// the shared middleware stack.
pub fn build_router(state: Arc<AppState>) -> Router {
    let customer_routes = Router::new()
        .route(
            "/api/customers",
            get(handlers::search_customers).post(handlers::create_customer),
        )
        .route(
            "/api/customers/:customer_id",
            get(handlers::get_customer_by_id)
                .put(handlers::update_customer)
                .delete(handlers::delete_customer),
        )
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(state.config.request_timeout)
                // Oversized bodies surface as a JSON rejection, mapped to 413
                .layer(DefaultBodyLimit::max(state.config.body_limit_bytes)),
        );

    Router::new()
        .route("/health", get(handlers::health))
        .route("/docs", get(serve_swagger_ui))
        .route("/api-docs/openapi.json", get(serve_openapi_spec))
        .merge(customer_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
