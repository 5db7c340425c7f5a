//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged between HTTP clients and the API server.
//! Field names are camelCase on the wire, matching the persisted catalog layout.

use catalog_core::domain::{
    NewProduct, Product, ProductPage, ProductPatch, ProductQuery, Review,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

//=========================================================================================
// Request Payloads
//=========================================================================================

/// A number sent either as a JSON number or as a numeric string (`"19.99"`).
#[derive(Deserialize, Debug, Clone, ToSchema)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Text(String),
}

impl NumericInput {
    /// The numeric value, or `None` if a string does not hold a finite number.
    pub fn value(&self) -> Option<f64> {
        match self {
            NumericInput::Number(n) => Some(*n),
            NumericInput::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }
}

/// Body of `POST /products` and `POST /admin/product/new`.
///
/// Every field is required; presence is checked by the catalog core so the
/// error can name all missing fields at once.
#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub title: Option<String>,
    pub price: Option<NumericInput>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

/// Body of `PUT /admin/product/{id}`. Unknown fields (including `id`) are ignored.
#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub price: Option<NumericInput>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

/// Body of `PUT /review`.
#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub product_id: String,
    pub rating: NumericInput,
    #[serde(default)]
    pub comment: String,
}

impl CreateProductRequest {
    /// Converts to the core draft. `Err` names the field holding a non-numeric value.
    pub fn into_new_product(self) -> Result<NewProduct, &'static str> {
        Ok(NewProduct {
            title: self.title,
            price: numeric_field(self.price, "price")?,
            description: self.description,
            category: self.category,
            image_url: self.image_url,
        })
    }
}

impl UpdateProductRequest {
    pub fn into_patch(self) -> Result<ProductPatch, &'static str> {
        Ok(ProductPatch {
            title: self.title,
            price: numeric_field(self.price, "price")?,
            description: self.description,
            category: self.category,
            image_url: self.image_url,
        })
    }
}

fn numeric_field(
    input: Option<NumericInput>,
    field: &'static str,
) -> Result<Option<f64>, &'static str> {
    match input {
        None => Ok(None),
        Some(input) => input.value().map(Some).ok_or(field),
    }
}

//=========================================================================================
// Query Parameters
//=========================================================================================

/// Query of `GET /products`. Paging values that are absent, zero or not
/// numbers fall back to page 1 and 12 results per page.
#[derive(Deserialize, Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListProductsQuery {
    /// Case-insensitive category filter.
    pub category: Option<String>,
    /// 1-based page number.
    pub page: Option<String>,
    /// Results per page.
    pub limit: Option<String>,
}

impl ListProductsQuery {
    pub fn into_query(self) -> ProductQuery {
        ProductQuery::new(
            self.category,
            parse_count(self.page.as_deref()),
            parse_count(self.limit.as_deref()),
        )
    }
}

fn parse_count(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
}

/// Query of `GET /admin/reviews`.
#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductReviewsQuery {
    /// The product whose reviews are listed.
    pub id: String,
}

/// Query of `DELETE /admin/reviews`.
#[derive(Deserialize, Debug, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DeleteReviewQuery {
    pub product_id: String,
    /// The review to remove.
    pub id: String,
}

//=========================================================================================
// Response Payloads
//=========================================================================================

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: String,
    pub user: String,
    pub name: String,
    pub rating: f64,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            user: review.user,
            name: review.name,
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub category: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub reviews: Vec<ReviewResponse>,
    pub ratings: f64,
    pub num_of_reviews: usize,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            title: product.title,
            price: product.price,
            description: product.description,
            category: product.category,
            image_url: product.image_url,
            created_at: product.created_at,
            updated_at: product.updated_at,
            reviews: product.reviews.into_iter().map(Into::into).collect(),
            ratings: product.ratings,
            num_of_reviews: product.num_of_reviews,
        }
    }
}

/// Response of `GET /products`.
#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductListResponse {
    pub success: bool,
    pub products: Vec<ProductResponse>,
    /// Size of the whole catalog, ignoring the category filter.
    pub products_count: usize,
    pub result_per_page: usize,
    /// Number of products matching the category filter.
    pub filtered_products_count: usize,
    pub current_page: usize,
    pub total_pages: usize,
}

impl From<ProductPage> for ProductListResponse {
    fn from(page: ProductPage) -> Self {
        Self {
            success: true,
            products: page.products.into_iter().map(Into::into).collect(),
            products_count: page.products_count,
            result_per_page: page.result_per_page,
            filtered_products_count: page.filtered_products_count,
            current_page: page.current_page,
            total_pages: page.total_pages,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ProductsResponse {
    pub success: bool,
    pub products: Vec<ProductResponse>,
}

impl From<Vec<Product>> for ProductsResponse {
    fn from(products: Vec<Product>) -> Self {
        Self {
            success: true,
            products: products.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ProductEnvelope {
    pub success: bool,
    pub product: ProductResponse,
}

impl From<Product> for ProductEnvelope {
    fn from(product: Product) -> Self {
        Self {
            success: true,
            product: product.into(),
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ReviewsResponse {
    pub success: bool,
    pub reviews: Vec<ReviewResponse>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
