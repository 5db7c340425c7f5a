//! crates/catalog_core/src/domain.rs
//!
//! Defines the pure, core data structures for the catalog.
//! These structs are independent of any storage or serialization format.

use chrono::{DateTime, Utc};

/// The `user` value recorded on reviews submitted without an identity.
pub const ANONYMOUS_USER: &str = "anonymous";

/// The display name recorded on reviews submitted without an identity.
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// A single product in the catalog.
///
/// `ratings` and `num_of_reviews` are materialized from `reviews` and must only
/// be changed through [`Product::refresh_rating_summary`].
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub image_url: String,
    pub price: f64,
    pub reviews: Vec<Review>,
    pub ratings: f64,
    pub num_of_reviews: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Recomputes `ratings` and `num_of_reviews` from the current `reviews`.
    pub fn refresh_rating_summary(&mut self) {
        self.num_of_reviews = self.reviews.len();
        self.ratings = if self.reviews.is_empty() {
            0.0
        } else {
            // Dividing first keeps the mean finite for any finite ratings.
            let count = self.reviews.len() as f64;
            self.reviews.iter().map(|r| r.rating / count).sum()
        };
    }

    /// Case-insensitive category comparison used by listing filters.
    pub fn in_category(&self, category: &str) -> bool {
        self.category.to_lowercase() == category.to_lowercase()
    }
}

/// A review left on a product. At most one per `user` per product.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub id: String,
    pub user: String,
    pub name: String,
    pub rating: f64,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Who is submitting a review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewAuthor {
    User { id: String, name: String },
    Anonymous,
}

impl ReviewAuthor {
    /// The `(user, name)` pair stored on the review.
    pub fn into_parts(self) -> (String, String) {
        match self {
            ReviewAuthor::User { id, name } => (id, name),
            ReviewAuthor::Anonymous => (ANONYMOUS_USER.to_string(), ANONYMOUS_NAME.to_string()),
        }
    }
}

/// Fields supplied when creating a product. Every field is required; they are
/// optional here so the service can report exactly which ones are missing.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<f64>,
}

/// A partial update. Absent fields keep their stored value.
///
/// Identity, timestamps and review data are deliberately not representable.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<f64>,
}

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_PAGE_SIZE: usize = 12;

/// Listing parameters for the paginated browse view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub page: usize,
    pub page_size: usize,
}

impl ProductQuery {
    /// Builds a query, replacing absent or zero paging values with the defaults.
    pub fn new(category: Option<String>, page: Option<usize>, page_size: Option<usize>) -> Self {
        Self {
            category: category.filter(|c| !c.is_empty()),
            page: page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE),
            page_size: page_size.filter(|s| *s > 0).unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}

/// One page of the (optionally filtered) catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub products_count: usize,
    pub filtered_products_count: usize,
    pub result_per_page: usize,
    pub current_page: usize,
    pub total_pages: usize,
}
