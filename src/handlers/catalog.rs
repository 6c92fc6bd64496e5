use crate::handlers::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    entities::{ProductKind, ProductModel, ProductSpecs},
    errors::{ApiError, ServiceError},
    services::{CreateCategoryInput, CreateProductInput},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use validator::Validate;

/// Routes for the landing-page aggregations
pub fn catalog_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sidebar", get(sidebar))
        .route("/latest", get(latest))
}

/// Routes for product detail and creation
pub fn products_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_product))
        .route("/:kind/:slug", get(get_product))
}

/// Routes for categories
pub fn categories_routes() -> Router<Arc<AppState>> {
    Router::new().route("/", post(create_category))
}

/// Sidebar categories with live product counts
async fn sidebar(
    State(state): State<Arc<AppState>>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let categories = state
        .services
        .categories
        .list_for_sidebar()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(categories))
}

/// Latest products across the requested kinds.
///
/// `kinds` is strict: an unrecognized kind is an invalid argument.
/// `prioritize` is lenient: an unrecognized or non-member kind simply leaves
/// the order untouched, matching the aggregation contract.
async fn latest(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LatestQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let kinds = query
        .kinds
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_kind)
        .collect::<Result<Vec<_>, _>>()
        .map_err(map_service_error)?;

    let prioritize = query
        .prioritize
        .as_deref()
        .and_then(|s| ProductKind::from_str(s).ok());

    let products = state
        .services
        .catalog
        .latest(&kinds, prioritize)
        .await
        .map_err(map_service_error)?;

    let products: Vec<ProductResponse> = products.into_iter().map(Into::into).collect();
    Ok(success_response(products))
}

/// Product detail by (kind, slug)
async fn get_product(
    State(state): State<Arc<AppState>>,
    Path((kind, slug)): Path<(String, String)>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let kind = parse_kind(&kind).map_err(map_service_error)?;

    let product = state
        .services
        .catalog
        .get_by_slug(kind, &slug)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(ProductResponse::from(product)))
}

/// Create a product
async fn create_product(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = CreateProductInput {
        category_id: payload.category_id,
        title: payload.title,
        slug: payload.slug,
        image: payload.image,
        description: payload.description,
        price: payload.price,
        specs: payload.specs,
    };

    let product = state
        .services
        .catalog
        .create_product(input)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(ProductResponse::from(product)))
}

/// Create a category
async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let product_kind = payload
        .product_kind
        .as_deref()
        .map(parse_kind)
        .transpose()
        .map_err(map_service_error)?;

    let input = CreateCategoryInput {
        name: payload.name,
        slug: payload.slug,
        product_kind,
    };

    let category = state
        .services
        .categories
        .create_category(input)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(category))
}

fn parse_kind(raw: &str) -> Result<ProductKind, ServiceError> {
    ProductKind::from_str(raw)
        .map_err(|_| ServiceError::InvalidInput(format!("Unrecognized product kind '{}'", raw)))
}

// Request/response DTOs

#[derive(Debug, Deserialize)]
pub struct LatestQuery {
    pub kinds: String,
    pub prioritize: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    pub category_id: Option<i32>,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1, max = 255))]
    pub slug: String,
    pub image: Option<String>,
    pub description: String,
    pub price: Decimal,
    pub specs: ProductSpecs,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub slug: String,
    pub product_kind: Option<String>,
}

/// Product plus its derived display route
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    #[serde(flatten)]
    pub product: ProductModel,
    pub url: String,
}

impl From<ProductModel> for ProductResponse {
    fn from(product: ProductModel) -> Self {
        let url = product.detail_url();
        Self { product, url }
    }
}
