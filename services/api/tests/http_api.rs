use std::path::{Path, PathBuf};
use std::sync::Arc;

use api_lib::adapters::JsonFileStore;
use api_lib::config::Config;
use api_lib::web::{build_router, state::AppState};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use catalog_core::service::CatalogService;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const ADMIN: &[(&str, &str)] = &[
    ("x-user-id", "admin-1"),
    ("x-user-name", "Admin"),
    ("x-user-role", "admin"),
];

struct TestApp {
    router: Router,
    catalog_path: PathBuf,
    _dir: TempDir,
}

impl TestApp {
    fn new(allow_anonymous_reviews: bool) -> Self {
        let dir = TempDir::new().unwrap();
        let catalog_path = dir.path().join("data").join("products.json");
        let path_str = catalog_path.display().to_string();
        let config = Config::from_lookup(|key| match key {
            "CATALOG_PATH" => Some(path_str.clone()),
            "ALLOW_ANONYMOUS_REVIEWS" => Some(allow_anonymous_reviews.to_string()),
            _ => None,
        })
        .unwrap();

        let store = Arc::new(JsonFileStore::new(catalog_path.clone()));
        let app_state = Arc::new(AppState {
            catalog: Arc::new(CatalogService::new(store)),
            config: Arc::new(config),
        });

        Self {
            router: build_router(app_state),
            catalog_path,
            _dir: dir,
        }
    }

    fn seed(&self, products: Value) {
        std::fs::create_dir_all(self.catalog_path.parent().unwrap()).unwrap();
        std::fs::write(&self.catalog_path, serde_json::to_vec_pretty(&products).unwrap()).unwrap();
    }

    fn stored(&self) -> Option<String> {
        read_optional(&self.catalog_path)
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, &[]).await
    }
}

fn read_optional(path: &Path) -> Option<String> {
    std::fs::read_to_string(path).ok()
}

fn seeded_product(id: &str, category: &str, price: f64) -> Value {
    json!({
        "id": id,
        "title": format!("Product {id}"),
        "price": price,
        "description": "Seeded",
        "category": category,
        "imageUrl": format!("https://img.example/{id}.png"),
        "createdAt": "2024-01-01T00:00:00.000Z",
        "updatedAt": "2024-01-01T00:00:00.000Z"
    })
}

fn ids(body: &Value) -> Vec<String> {
    body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap().to_string())
        .collect()
}

fn reviewer(id: &'static str) -> [(&'static str, &'static str); 2] {
    [("x-user-id", id), ("x-user-name", id)]
}

#[tokio::test]
async fn category_filter_is_case_insensitive_and_counts_both_totals() {
    let app = TestApp::new(false);
    app.seed(json!([
        seeded_product("1", "Electronics", 10.0),
        seeded_product("2", "Books", 5.0)
    ]));

    let (status, body) = app.get("/products?category=books&page=1&limit=12").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(ids(&body), vec!["2"]);
    assert_eq!(body["filteredProductsCount"], 1);
    assert_eq!(body["productsCount"], 2);
    assert_eq!(body["totalPages"], 1);
    assert_eq!(body["resultPerPage"], 12);
    assert_eq!(body["currentPage"], 1);
}

#[tokio::test]
async fn minimal_hand_written_catalog_is_served_and_kept_on_write() {
    let app = TestApp::new(false);
    app.seed(json!([
        { "id": "1", "category": "Electronics", "price": 10 },
        { "id": "2", "category": "Books", "price": 5 }
    ]));

    let (status, body) = app.get("/products?category=books&page=1&limit=12").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec!["2"]);
    assert_eq!(body["filteredProductsCount"], 1);
    assert_eq!(body["productsCount"], 2);

    let (status, _) = app
        .send(
            Method::POST,
            "/products",
            Some(json!({
                "title": "Lamp",
                "price": 20,
                "description": "Desk lamp",
                "category": "Home",
                "imageUrl": "https://img.example/lamp.png"
            })),
            &[],
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = app.get("/products/all").await;
    let all = ids(&body);
    assert_eq!(all.len(), 3);
    assert_eq!(all[..2], ["1".to_string(), "2".to_string()]);
}

#[tokio::test]
async fn pagination_defaults_and_out_of_range_pages() {
    let app = TestApp::new(false);
    let products: Vec<Value> = (1..=5)
        .map(|i| seeded_product(&i.to_string(), "Books", 1.0))
        .collect();
    app.seed(Value::Array(products));

    let (_, body) = app.get("/products?limit=2&page=3").await;
    assert_eq!(ids(&body), vec!["5"]);
    assert_eq!(body["totalPages"], 3);

    let (status, body) = app.get("/products?limit=2&page=40").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["products"].as_array().unwrap().is_empty());

    let (_, body) = app.get("/products?limit=abc").await;
    assert_eq!(body["resultPerPage"], 12);
    assert_eq!(ids(&body).len(), 5);
}

#[tokio::test]
async fn missing_catalog_file_serves_an_empty_catalog() {
    let app = TestApp::new(false);

    let (status, body) = app.get("/products/all").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["products"], json!([]));
    assert_eq!(app.stored(), None);
}

#[tokio::test]
async fn created_product_is_persisted_and_retrievable() {
    let app = TestApp::new(false);

    let (status, body) = app
        .send(
            Method::POST,
            "/products",
            Some(json!({
                "title": "Lamp",
                "price": "19.99",
                "description": "Desk lamp",
                "category": "Home",
                "imageUrl": "https://img.example/lamp.png"
            })),
            &[],
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let product = body["product"].clone();
    assert_eq!(product["price"], 19.99);
    assert_eq!(product["numOfReviews"], 0);
    assert_eq!(product["createdAt"], product["updatedAt"]);

    let id = product["id"].as_str().unwrap();
    let (status, body) = app.get(&format!("/products/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"], product);

    let stored: Value = serde_json::from_str(&app.stored().unwrap()).unwrap();
    assert_eq!(stored[0]["imageUrl"], "https://img.example/lamp.png");
}

#[tokio::test]
async fn create_with_missing_fields_is_rejected_without_writing() {
    let app = TestApp::new(false);

    let (status, body) = app
        .send(
            Method::POST,
            "/products",
            Some(json!({ "title": "Lamp", "category": "" })),
            &[],
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("price"));
    assert!(message.contains("category"));
    assert_eq!(app.stored(), None);

    let (status, _) = app
        .send(
            Method::POST,
            "/products",
            Some(json!({ "title": "Lamp", "price": "free" })),
            &[],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_product_is_not_found() {
    let app = TestApp::new(false);
    let (status, body) = app.get("/products/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn admin_routes_require_the_admin_role() {
    let app = TestApp::new(false);
    app.seed(json!([seeded_product("1", "Books", 5.0)]));

    let (status, _) = app.get("/admin/products").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(Method::GET, "/admin/products", None, &reviewer("u1"))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send(Method::GET, "/admin/products", None, ADMIN).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec!["1"]);
}

#[tokio::test]
async fn admin_update_merges_fields_and_keeps_the_id() {
    let app = TestApp::new(false);
    app.seed(json!([seeded_product("1", "Books", 5.0)]));

    let (status, body) = app
        .send(
            Method::PUT,
            "/admin/product/1",
            Some(json!({ "id": "hijacked", "price": 7.5, "numOfReviews": 99 })),
            ADMIN,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let product = &body["product"];
    assert_eq!(product["id"], "1");
    assert_eq!(product["price"], 7.5);
    assert_eq!(product["title"], "Product 1");
    assert_eq!(product["numOfReviews"], 0);
    assert_ne!(product["updatedAt"], "2024-01-01T00:00:00Z");

    let (status, _) = app
        .send(Method::PUT, "/admin/product/2", Some(json!({ "price": 1 })), ADMIN)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_delete_of_unknown_product_leaves_file_untouched() {
    let app = TestApp::new(false);
    app.seed(json!([
        seeded_product("1", "Books", 5.0),
        seeded_product("2", "Books", 6.0)
    ]));
    let before = app.stored();

    let (status, _) = app
        .send(Method::DELETE, "/admin/product/404", None, ADMIN)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.stored(), before);

    let (status, body) = app
        .send(Method::DELETE, "/admin/product/1", None, ADMIN)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product deleted successfully");
    let (_, body) = app.get("/products/all").await;
    assert_eq!(ids(&body), vec!["2"]);
}

#[tokio::test]
async fn reviews_are_upserted_per_user_and_aggregated() {
    let app = TestApp::new(false);
    app.seed(json!([seeded_product("1", "Books", 5.0)]));

    for (user, rating) in [("u1", json!(2)), ("u2", json!("5")), ("u1", json!(4))] {
        let (status, body) = app
            .send(
                Method::PUT,
                "/review",
                Some(json!({ "productId": "1", "rating": rating, "comment": "ok" })),
                &reviewer(user),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    let (_, body) = app.get("/products/1").await;
    let product = &body["product"];
    assert_eq!(product["ratings"], 4.5);
    assert_eq!(product["numOfReviews"], 2);
    assert_eq!(product["reviews"][0]["user"], "u1");
    assert_eq!(product["reviews"][0]["rating"], 4.0);

    let (status, body) = app.get("/admin/reviews?id=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reviews"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn deleting_reviews_recomputes_and_unknown_ids_are_not_found() {
    let app = TestApp::new(false);
    app.seed(json!([seeded_product("1", "Books", 5.0)]));
    app.send(
        Method::PUT,
        "/review",
        Some(json!({ "productId": "1", "rating": 3 })),
        &reviewer("u1"),
    )
    .await;
    let (_, body) = app.get("/admin/reviews?id=1").await;
    let review_id = body["reviews"][0]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/admin/reviews?productId=1&id={review_id}"),
            None,
            &[],
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let before = app.stored();
    let (status, _) = app
        .send(
            Method::DELETE,
            "/admin/reviews?productId=1&id=missing",
            None,
            &reviewer("u1"),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.stored(), before);

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/admin/reviews?productId=1&id={review_id}"),
            None,
            &reviewer("u1"),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/products/1").await;
    assert_eq!(body["product"]["ratings"], 0.0);
    assert_eq!(body["product"]["numOfReviews"], 0);
    assert_eq!(body["product"]["reviews"], json!([]));
}

#[tokio::test]
async fn review_validation_and_unknown_products() {
    let app = TestApp::new(false);
    app.seed(json!([seeded_product("1", "Books", 5.0)]));

    let (status, _) = app
        .send(
            Method::PUT,
            "/review",
            Some(json!({ "productId": "1", "rating": 9 })),
            &reviewer("u1"),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::PUT,
            "/review",
            Some(json!({ "productId": "1", "rating": "great" })),
            &reviewer("u1"),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::PUT,
            "/review",
            Some(json!({ "productId": "404", "rating": 4 })),
            &reviewer("u1"),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/admin/reviews?id=404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn anonymous_reviews_follow_configuration() {
    let review = json!({ "productId": "1", "rating": 5, "comment": "nice" });

    let closed = TestApp::new(false);
    closed.seed(json!([seeded_product("1", "Books", 5.0)]));
    let (status, _) = closed
        .send(Method::PUT, "/review", Some(review.clone()), &[])
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let open = TestApp::new(true);
    open.seed(json!([seeded_product("1", "Books", 5.0)]));
    let (status, _) = open.send(Method::PUT, "/review", Some(review), &[]).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = open.get("/admin/reviews?id=1").await;
    assert_eq!(body["reviews"][0]["user"], "anonymous");
    assert_eq!(body["reviews"][0]["name"], "Anonymous");
}

#[tokio::test]
async fn health_and_openapi_document_are_served() {
    let app = TestApp::new(false);

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = app.get("/api-docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/products"].is_object());
    assert!(body["paths"]["/review"].is_object());
}
