use crate::handlers::common::{created_response, map_service_error, success_response};
use crate::{
    errors::ApiError,
    services::{GetOrCreateCustomerInput, UpdateContactInput},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Routes for customer records
pub fn customer_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_by_user))
        .route("/", post(get_or_create))
        .route("/:id/contact", put(update_contact))
}

/// Strict lookup of the customer record for a platform user.
async fn get_by_user(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CustomerLookupQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let customer = state
        .services
        .customers
        .get_by_user(query.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(customer))
}

/// Returns the customer for a platform user, creating the record on first
/// commerce interaction.
async fn get_or_create(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GetOrCreateCustomerInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let customer = state
        .services
        .customers
        .get_or_create(payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(customer))
}

/// Updates the customer's contact fields.
async fn update_contact(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<UpdateContactInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let customer = state
        .services
        .customers
        .update_contact(customer_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(customer))
}

#[derive(Debug, Deserialize)]
pub struct CustomerLookupQuery {
    pub user_id: Uuid,
}
