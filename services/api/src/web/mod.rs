pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod state;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderName, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use middleware::{identify, require_admin, require_auth, Identity};
pub use rest::ApiDoc;
use rest::{
    admin_create_product_handler, admin_products_handler, all_products_handler,
    create_product_handler, delete_product_handler, delete_review_handler, get_product_handler,
    health_handler, list_products_handler, list_reviews_handler, update_product_handler,
    upsert_review_handler,
};
use state::AppState;

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Builds the complete application: catalog routes, identity guards, CORS,
/// request tracing and the Swagger UI.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(app_state.config.cors_origin.clone())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            ACCEPT,
            HeaderName::from_static(middleware::USER_ID_HEADER),
            HeaderName::from_static(middleware::USER_NAME_HEADER),
            HeaderName::from_static(middleware::USER_ROLE_HEADER),
        ]);

    // Public routes (no identity required)
    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/products", get(list_products_handler).post(create_product_handler))
        .route("/products/all", get(all_products_handler))
        .route("/products/{id}", get(get_product_handler))
        .route(
            "/admin/reviews",
            get(list_reviews_handler)
                .merge(delete(delete_review_handler).layer(axum_middleware::from_fn(require_auth))),
        );

    // Reviews: the identity is optional here, the handler decides about anonymous callers
    let review_routes = Router::new()
        .route("/review", put(upsert_review_handler))
        .route_layer(axum_middleware::from_fn(identify));

    // Admin routes (admin role required)
    let admin_routes = Router::new()
        .route("/admin/products", get(admin_products_handler))
        .route("/admin/product/new", post(admin_create_product_handler))
        .route(
            "/admin/product/{id}",
            put(update_product_handler).delete(delete_product_handler),
        )
        .route_layer(axum_middleware::from_fn(require_admin));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(review_routes)
        .merge(admin_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
