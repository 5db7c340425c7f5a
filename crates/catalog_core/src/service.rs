//! crates/catalog_core/src/service.rs
//!
//! The catalog operations. Each one reads the entire catalog from the store,
//! computes the new catalog in memory and, for mutations, writes the entire
//! catalog back.
//!
//! Mutations are serialized by a lock held across the whole
//! load → compute → save cycle, so two concurrent writers through the same
//! service can never overwrite each other's changes. Reads take no lock.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{
    NewProduct, Product, ProductPage, ProductPatch, ProductQuery, Review, ReviewAuthor,
};
use crate::ports::{CatalogStore, PortError, PortResult};

pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    write_lock: Mutex<()>,
}

impl CatalogService {
    /// Creates a service over the given store.
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    //=====================================================================================
    // Listing and retrieval
    //=====================================================================================

    /// Filters by category (case-insensitive) and returns the requested page.
    ///
    /// Pages past the end are empty rather than an error.
    pub async fn list_products(&self, query: &ProductQuery) -> ProductPage {
        let products = self.store.load().await;
        let products_count = products.len();

        let filtered: Vec<Product> = match &query.category {
            Some(category) => products
                .into_iter()
                .filter(|p| p.in_category(category))
                .collect(),
            None => products,
        };
        let filtered_products_count = filtered.len();

        let page_size = query.page_size.max(1);
        let start = query.page.saturating_sub(1).saturating_mul(page_size);
        let page = filtered.into_iter().skip(start).take(page_size).collect();

        ProductPage {
            products: page,
            products_count,
            filtered_products_count,
            result_per_page: page_size,
            current_page: query.page.max(1),
            total_pages: filtered_products_count.div_ceil(page_size),
        }
    }

    /// The whole catalog, unfiltered and unpaginated.
    pub async fn list_all_products(&self) -> Vec<Product> {
        self.store.load().await
    }

    pub async fn get_product(&self, id: &str) -> PortResult<Product> {
        self.store
            .load()
            .await
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| product_not_found(id))
    }

    //=====================================================================================
    // Product mutation
    //=====================================================================================

    /// Validates and appends a new product with a fresh id and timestamps.
    pub async fn create_product(&self, new: NewProduct) -> PortResult<Product> {
        let mut invalid = Vec::new();
        let title = required_text(new.title, "title", &mut invalid);
        let description = required_text(new.description, "description", &mut invalid);
        let category = required_text(new.category, "category", &mut invalid);
        let image_url = required_text(new.image_url, "imageUrl", &mut invalid);
        let price = match new.price {
            Some(price) if valid_price(price) => price,
            _ => {
                invalid.push("price");
                0.0
            }
        };
        if !invalid.is_empty() {
            return Err(PortError::Validation(format!(
                "Missing or invalid required fields: {}",
                invalid.join(", ")
            )));
        }

        let now = Utc::now();
        let product = Product {
            id: new_id(),
            title,
            description,
            category,
            image_url,
            price,
            reviews: Vec::new(),
            ratings: 0.0,
            num_of_reviews: 0,
            created_at: now,
            updated_at: now,
        };

        self.mutate(|products| {
            products.push(product.clone());
            Ok(product)
        })
        .await
    }

    /// Merges `patch` over the stored product. The id can never change.
    pub async fn update_product(&self, id: &str, patch: ProductPatch) -> PortResult<Product> {
        validate_patch(&patch)?;

        self.mutate(|products| {
            let index = position(products, id)?;
            let product = &mut products[index];

            if let Some(title) = patch.title {
                product.title = title;
            }
            if let Some(description) = patch.description {
                product.description = description;
            }
            if let Some(category) = patch.category {
                product.category = category;
            }
            if let Some(image_url) = patch.image_url {
                product.image_url = image_url;
            }
            if let Some(price) = patch.price {
                product.price = price;
            }
            product.updated_at = Utc::now();

            Ok(product.clone())
        })
        .await
    }

    /// Removes exactly the product with `id`.
    pub async fn delete_product(&self, id: &str) -> PortResult<()> {
        self.mutate(|products| {
            let index = position(products, id)?;
            products.remove(index);
            Ok(())
        })
        .await
    }

    //=====================================================================================
    // Reviews
    //=====================================================================================

    /// Adds a review, or replaces the author's previous review on the product,
    /// then recomputes the product's rating summary.
    pub async fn upsert_review(
        &self,
        product_id: &str,
        author: ReviewAuthor,
        rating: f64,
        comment: String,
    ) -> PortResult<Review> {
        if !rating.is_finite() {
            return Err(PortError::Validation(
                "rating must be a finite number".to_string(),
            ));
        }

        let now = Utc::now();
        let (user, name) = author.into_parts();
        let review = Review {
            id: new_id(),
            user,
            name,
            rating,
            comment,
            created_at: now,
        };

        self.mutate(|products| {
            let index = position(products, product_id)?;
            let product = &mut products[index];

            match product.reviews.iter().position(|r| r.user == review.user) {
                Some(existing) => product.reviews[existing] = review.clone(),
                None => product.reviews.push(review.clone()),
            }
            product.refresh_rating_summary();
            product.updated_at = now;

            Ok(review)
        })
        .await
    }

    pub async fn list_reviews(&self, product_id: &str) -> PortResult<Vec<Review>> {
        Ok(self.get_product(product_id).await?.reviews)
    }

    /// Removes one review and recomputes the product's rating summary.
    pub async fn delete_review(&self, product_id: &str, review_id: &str) -> PortResult<()> {
        self.mutate(|products| {
            let index = position(products, product_id)?;
            let product = &mut products[index];

            let before = product.reviews.len();
            product.reviews.retain(|r| r.id != review_id);
            if product.reviews.len() == before {
                return Err(PortError::NotFound(format!(
                    "Review {} not found on product {}",
                    review_id, product_id
                )));
            }
            product.refresh_rating_summary();
            product.updated_at = Utc::now();

            Ok(())
        })
        .await
    }

    //=====================================================================================
    // Helpers
    //=====================================================================================

    /// Runs one read-modify-write cycle under the write lock.
    ///
    /// `op` sees the freshly loaded catalog; the store is only written when it
    /// succeeds, so a failed operation leaves the persisted catalog untouched.
    async fn mutate<T, F>(&self, op: F) -> PortResult<T>
    where
        F: FnOnce(&mut Vec<Product>) -> PortResult<T> + Send,
        T: Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut products = self.store.load().await;
        let output = op(&mut products)?;
        self.store.save(&products).await?;
        Ok(output)
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn product_not_found(id: &str) -> PortError {
    PortError::NotFound(format!("Product {} not found", id))
}

fn position(products: &[Product], id: &str) -> PortResult<usize> {
    products
        .iter()
        .position(|p| p.id == id)
        .ok_or_else(|| product_not_found(id))
}

fn valid_price(price: f64) -> bool {
    price.is_finite() && price >= 0.0
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn required_text(
    value: Option<String>,
    field: &'static str,
    invalid: &mut Vec<&'static str>,
) -> String {
    match value {
        Some(text) if !is_blank(&text) => text,
        _ => {
            invalid.push(field);
            String::new()
        }
    }
}

fn validate_patch(patch: &ProductPatch) -> PortResult<()> {
    let mut invalid = Vec::new();
    let text_fields = [
        ("title", &patch.title),
        ("description", &patch.description),
        ("category", &patch.category),
        ("imageUrl", &patch.image_url),
    ];
    for (field, value) in text_fields {
        if matches!(value, Some(text) if is_blank(text)) {
            invalid.push(field);
        }
    }
    if matches!(patch.price, Some(price) if !valid_price(price)) {
        invalid.push("price");
    }

    if invalid.is_empty() {
        Ok(())
    } else {
        Err(PortError::Validation(format!(
            "Invalid fields: {}",
            invalid.join(", ")
        )))
    }
}
