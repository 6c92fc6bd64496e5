use crate::handlers::common::{map_service_error, no_content_response, success_response, validate_input};
use crate::{
    entities::ProductKind,
    errors::{ApiError, ServiceError},
    services::{AddItemInput, CartOwner},
    AppState,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, Json, Path, State},
    http::request::Parts,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Cart routes. Every route resolves the caller's cart through the
/// [`CartOwner`] extractor, so a caller can only ever touch their own
/// active cart.
pub fn cart_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_cart))
        .route("/items", post(add_item))
        .route("/items/:line_id", put(set_quantity))
        .route("/items/:line_id", delete(remove_item))
        .route("/checkout", post(checkout))
}

/// Resolves the caller's cart identity from request headers.
///
/// `X-Customer-Id` (a customer UUID) wins over `X-Session-Id` (an opaque
/// anonymous session token). A request carrying neither has no cart to
/// speak of and is rejected.
#[async_trait]
impl<S> FromRequestParts<S> for CartOwner
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(raw) = parts.headers.get("x-customer-id") {
            let raw = raw.to_str().map_err(|_| {
                ApiError::from(ServiceError::InvalidInput(
                    "X-Customer-Id header is not valid UTF-8".to_string(),
                ))
            })?;
            let customer_id = Uuid::parse_str(raw).map_err(|_| {
                ApiError::from(ServiceError::InvalidInput(format!(
                    "X-Customer-Id '{}' is not a valid UUID",
                    raw
                )))
            })?;
            return Ok(CartOwner::Customer(customer_id));
        }

        if let Some(raw) = parts.headers.get("x-session-id") {
            let session_id = raw.to_str().map_err(|_| {
                ApiError::from(ServiceError::InvalidInput(
                    "X-Session-Id header is not valid UTF-8".to_string(),
                ))
            })?;
            if !session_id.is_empty() {
                return Ok(CartOwner::Anonymous(session_id.to_string()));
            }
        }

        Err(ApiError::from(ServiceError::Unauthorized(
            "Provide an X-Customer-Id or X-Session-Id header".to_string(),
        )))
    }
}

/// Returns the caller's active cart with its lines, creating the cart on
/// first touch.
async fn get_cart(
    State(state): State<Arc<AppState>>,
    owner: CartOwner,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let cart = state
        .services
        .cart
        .get_or_create_active_cart(&owner)
        .await
        .map_err(map_service_error)?;

    let cart_with_lines = state
        .services
        .cart
        .get_cart(cart.id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(cart_with_lines))
}

/// Adds a product to the caller's active cart.
async fn add_item(
    State(state): State<Arc<AppState>>,
    owner: CartOwner,
    Json(payload): Json<AddItemRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let kind = ProductKind::from_str(&payload.kind).map_err(|_| {
        map_service_error(ServiceError::InvalidInput(format!(
            "Unrecognized product kind '{}'",
            payload.kind
        )))
    })?;

    let cart = state
        .services
        .cart
        .get_or_create_active_cart(&owner)
        .await
        .map_err(map_service_error)?;

    let updated = state
        .services
        .cart
        .add_item(
            cart.id,
            AddItemInput {
                kind,
                product_id: payload.product_id,
                quantity: payload.quantity,
            },
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(updated))
}

/// Sets the quantity of a line in the caller's active cart.
async fn set_quantity(
    State(state): State<Arc<AppState>>,
    owner: CartOwner,
    Path(line_id): Path<Uuid>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let cart = state
        .services
        .cart
        .get_or_create_active_cart(&owner)
        .await
        .map_err(map_service_error)?;

    let updated = state
        .services
        .cart
        .set_quantity(cart.id, line_id, payload.quantity)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(updated))
}

/// Removes a line from the caller's active cart.
async fn remove_item(
    State(state): State<Arc<AppState>>,
    owner: CartOwner,
    Path(line_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let cart = state
        .services
        .cart
        .get_or_create_active_cart(&owner)
        .await
        .map_err(map_service_error)?;

    state
        .services
        .cart
        .remove_item(cart.id, line_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Checks the caller's active cart out. The cart becomes read-only; a new
/// active cart is created on the caller's next cart request.
async fn checkout(
    State(state): State<Arc<AppState>>,
    owner: CartOwner,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let cart = state
        .services
        .cart
        .get_or_create_active_cart(&owner)
        .await
        .map_err(map_service_error)?;

    let ordered = state
        .services
        .cart
        .checkout(cart.id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ordered))
}

// Request DTOs

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddItemRequest {
    pub kind: String,
    pub product_id: i64,
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}
