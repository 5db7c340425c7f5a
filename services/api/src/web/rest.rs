//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::{ApiError, ErrorResponse};
use crate::web::middleware::Identity;
use crate::web::protocol::{
    CreateProductRequest, DeleteReviewQuery, ListProductsQuery, MessageResponse, NumericInput,
    ProductEnvelope, ProductListResponse, ProductResponse, ProductReviewsQuery, ProductsResponse,
    ReviewRequest, ReviewResponse, ReviewsResponse, UpdateProductRequest,
};
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use catalog_core::domain::ReviewAuthor;
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;

/// Accepted review ratings, inclusive.
pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        list_products_handler,
        all_products_handler,
        get_product_handler,
        create_product_handler,
        admin_products_handler,
        admin_create_product_handler,
        update_product_handler,
        delete_product_handler,
        upsert_review_handler,
        list_reviews_handler,
        delete_review_handler,
    ),
    components(
        schemas(
            CreateProductRequest, UpdateProductRequest, ReviewRequest, NumericInput,
            ProductResponse, ReviewResponse, ProductListResponse, ProductsResponse,
            ProductEnvelope, ReviewsResponse, MessageResponse, ErrorResponse
        )
    ),
    tags(
        (name = "Catalog API", description = "Product catalog with reviews and rating aggregation.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Public Handlers
//=========================================================================================

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = MessageResponse))
)]
pub async fn health_handler() -> Json<MessageResponse> {
    Json(MessageResponse::ok("ok"))
}

/// Browse products, optionally filtered by category, one page at a time.
#[utoipa::path(
    get,
    path = "/products",
    params(ListProductsQuery),
    responses((status = 200, description = "One page of products", body = ProductListResponse))
)]
pub async fn list_products_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<ListProductsQuery>,
) -> Json<ProductListResponse> {
    let page = app_state.catalog.list_products(&params.into_query()).await;
    Json(page.into())
}

/// Every product, unfiltered and unpaginated (sliders and carousels).
#[utoipa::path(
    get,
    path = "/products/all",
    responses((status = 200, description = "The whole catalog", body = ProductsResponse))
)]
pub async fn all_products_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<ProductsResponse> {
    Json(app_state.catalog.list_all_products().await.into())
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "The product", body = ProductEnvelope),
        (status = 404, description = "Product not found", body = ErrorResponse)
    )
)]
pub async fn get_product_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProductEnvelope>, ApiError> {
    let product = app_state.catalog.get_product(&id).await?;
    Ok(Json(product.into()))
}

/// Create a product without authentication.
#[utoipa::path(
    post,
    path = "/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductEnvelope),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 500, description = "Catalog could not be written", body = ErrorResponse)
    )
)]
pub async fn create_product_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductEnvelope>), ApiError> {
    create_product(&app_state, req).await
}

#[utoipa::path(
    get,
    path = "/admin/reviews",
    params(ProductReviewsQuery),
    responses(
        (status = 200, description = "Reviews of the product", body = ReviewsResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    )
)]
pub async fn list_reviews_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<ProductReviewsQuery>,
) -> Result<Json<ReviewsResponse>, ApiError> {
    let reviews = app_state.catalog.list_reviews(&params.id).await?;
    Ok(Json(ReviewsResponse {
        success: true,
        reviews: reviews.into_iter().map(Into::into).collect(),
    }))
}

//=========================================================================================
// Authenticated Handlers
//=========================================================================================

/// Create or replace the caller's review of a product.
///
/// Requests without an identity are accepted as the anonymous reviewer only
/// when anonymous reviews are enabled in the configuration.
#[utoipa::path(
    put,
    path = "/review",
    request_body = ReviewRequest,
    params(
        ("x-user-id" = Option<String>, Header, description = "Reviewing user"),
        ("x-user-name" = Option<String>, Header, description = "Display name")
    ),
    responses(
        (status = 200, description = "Review stored", body = MessageResponse),
        (status = 400, description = "Rating missing or out of range", body = ErrorResponse),
        (status = 401, description = "No identity", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    )
)]
pub async fn upsert_review_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Option<Identity>>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let author = match identity {
        Some(identity) => identity.into_author(),
        None if app_state.config.allow_anonymous_reviews => ReviewAuthor::Anonymous,
        None => return Err(ApiError::Unauthorized),
    };

    let rating = req
        .rating
        .value()
        .ok_or_else(|| ApiError::BadRequest("rating must be a number".to_string()))?;
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(ApiError::BadRequest(format!(
            "rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )));
    }

    let review = app_state
        .catalog
        .upsert_review(&req.product_id, author, rating, req.comment)
        .await?;
    info!(
        "Review {} by {} stored on product {}",
        review.id, review.user, req.product_id
    );
    Ok(Json(MessageResponse::ok("Review added successfully")))
}

#[utoipa::path(
    delete,
    path = "/admin/reviews",
    params(DeleteReviewQuery),
    responses(
        (status = 200, description = "Review deleted", body = MessageResponse),
        (status = 401, description = "No identity", body = ErrorResponse),
        (status = 404, description = "Product or review not found", body = ErrorResponse)
    )
)]
pub async fn delete_review_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<DeleteReviewQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    app_state
        .catalog
        .delete_review(&params.product_id, &params.id)
        .await?;
    info!(
        "Review {} deleted from product {} by {}",
        params.id, params.product_id, identity.user_id
    );
    Ok(Json(MessageResponse::ok("Review deleted successfully")))
}

//=========================================================================================
// Admin Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/admin/products",
    responses(
        (status = 200, description = "The whole catalog", body = ProductsResponse),
        (status = 401, description = "No identity", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse)
    )
)]
pub async fn admin_products_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<ProductsResponse> {
    Json(app_state.catalog.list_all_products().await.into())
}

#[utoipa::path(
    post,
    path = "/admin/product/new",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductEnvelope),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse)
    )
)]
pub async fn admin_create_product_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductEnvelope>), ApiError> {
    create_product(&app_state, req).await
}

/// Update a product. Fields left out of the body keep their current value.
#[utoipa::path(
    put,
    path = "/admin/product/{id}",
    params(("id" = String, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated product", body = ProductEnvelope),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    )
)]
pub async fn update_product_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<ProductEnvelope>, ApiError> {
    let patch = req.into_patch().map_err(not_a_number)?;
    let product = app_state.catalog.update_product(&id, patch).await?;
    info!("Product {} updated", product.id);
    Ok(Json(product.into()))
}

#[utoipa::path(
    delete,
    path = "/admin/product/{id}",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product deleted", body = MessageResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    )
)]
pub async fn delete_product_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    app_state.catalog.delete_product(&id).await?;
    info!("Product {} deleted", id);
    Ok(Json(MessageResponse::ok("Product deleted successfully")))
}

//=========================================================================================
// Shared Helpers
//=========================================================================================

async fn create_product(
    app_state: &AppState,
    req: CreateProductRequest,
) -> Result<(StatusCode, Json<ProductEnvelope>), ApiError> {
    let new_product = req.into_new_product().map_err(not_a_number)?;
    let product = app_state.catalog.create_product(new_product).await?;
    info!("Product {} created in category {}", product.id, product.category);
    Ok((StatusCode::CREATED, Json(product.into())))
}

fn not_a_number(field: &str) -> ApiError {
    ApiError::BadRequest(format!("{} must be a number", field))
}
