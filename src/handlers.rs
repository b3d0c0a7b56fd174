use crate::config::Config;
use crate::errors::AppError;
use crate::models::*;
use crate::services::CustomerService;
use axum::{
    extract::{FromRequest, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use url::Url;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Customer operations over the configured store.
    pub customers: CustomerService,
    /// Application configuration.
    pub config: Config,
}

/// JSON body extractor whose rejections use the API error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Health check endpoint.
///
/// Returns the service status, version and the active store.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "store": state.config.store.name(),
        })),
    )
}

/// Relative URL of a customer resource, with the id percent-encoded.
pub fn customer_location(customer_id: &str) -> Result<HeaderValue, AppError> {
    let mut url = Url::parse("http://localhost/api/customers")
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| AppError::InternalError("customer URL cannot be a base".to_string()))?
        .push(customer_id);

    HeaderValue::from_str(url.path()).map_err(|e| AppError::InternalError(e.to_string()))
}

/// POST /api/customers
///
/// Creates a customer and points `Location` at the new resource.
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Customer",
    request_body = NewCustomer,
    responses(
        (status = 201, description = "Customer created", body = Customer,
            headers(("Location" = String, description = "URL of the created customer"))),
        (status = 400, description = "Invalid input data", body = ErrorBody),
        (status = 409, description = "Customer ID already exists", body = ErrorBody),
    )
)]
pub async fn create_customer(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<NewCustomer>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!("POST /customers - id: {:?}", request.customer_id);

    let customer = state.customers.create_customer(request).await?;
    let location = customer_location(&customer.customer_id)?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(customer),
    ))
}

/// GET /api/customers/:customer_id
#[utoipa::path(
    get,
    path = "/api/customers/{customer_id}",
    tag = "Customer",
    params(("customer_id" = String, Path, description = "Five character customer id")),
    responses(
        (status = 200, description = "Customer found", body = Customer),
        (status = 404, description = "Customer not found", body = ErrorBody),
    )
)]
pub async fn get_customer_by_id(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> Result<Json<Customer>, AppError> {
    tracing::info!("GET /customers/{}", customer_id);

    let customer = state.customers.get_customer_by_id(&customer_id).await?;
    Ok(Json(customer))
}

/// GET /api/customers
///
/// Partial, case-insensitive match on any combination of the query
/// parameters. No parameters lists every customer.
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Customer",
    params(CustomerSearch),
    responses(
        (status = 200, description = "Customers matching the search criteria", body = [Customer]),
    )
)]
pub async fn search_customers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CustomerSearch>,
) -> Result<Json<Vec<Customer>>, AppError> {
    tracing::info!("GET /customers - params: {:?}", params);

    let customers = state.customers.search_customers(params).await?;
    Ok(Json(customers))
}

/// PUT /api/customers/:customer_id
///
/// Replaces only the fields present in the body.
#[utoipa::path(
    put,
    path = "/api/customers/{customer_id}",
    tag = "Customer",
    params(("customer_id" = String, Path, description = "Five character customer id")),
    request_body = CustomerChanges,
    responses(
        (status = 200, description = "Customer updated", body = Customer),
        (status = 400, description = "Invalid input data", body = ErrorBody),
        (status = 404, description = "Customer not found", body = ErrorBody),
    )
)]
pub async fn update_customer(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
    AppJson(changes): AppJson<CustomerChanges>,
) -> Result<Json<Customer>, AppError> {
    tracing::info!("PUT /customers/{}", customer_id);

    let customer = state
        .customers
        .update_customer(&customer_id, changes)
        .await?;
    Ok(Json(customer))
}

/// DELETE /api/customers/:customer_id
///
/// Hard delete; the record cannot be recovered.
#[utoipa::path(
    delete,
    path = "/api/customers/{customer_id}",
    tag = "Customer",
    params(("customer_id" = String, Path, description = "Five character customer id")),
    responses(
        (status = 204, description = "Customer deleted"),
        (status = 404, description = "Customer not found", body = ErrorBody),
    )
)]
pub async fn delete_customer(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> Result<StatusCode, AppError> {
    tracing::info!("DELETE /customers/{}", customer_id);

    state.customers.delete_customer(&customer_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
