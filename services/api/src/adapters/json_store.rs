//! services/api/src/adapters/json_store.rs
//!
//! This module contains the file adapter, which is the concrete implementation
//! of the `CatalogStore` port from the `core` crate. The whole catalog lives in
//! a single pretty-printed JSON array so it stays readable and hand-editable.

use async_trait::async_trait;
use catalog_core::domain::{Product, Review};
use catalog_core::ports::{CatalogStore, PortError, PortResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A file adapter that implements the `CatalogStore` port.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a new `JsonFileStore` backed by the file at `path`.
    ///
    /// The file does not need to exist yet; it is created on the first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `bytes` to a temporary sibling and renames it over the target,
    /// so readers see either the old catalog or the new one.
    async fn write_replacing(&self, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = self.temp_path();
        let written = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            fs::rename(&temp_path, &self.path).await
        }
        .await;

        if written.is_err() {
            let _ = fs::remove_file(&temp_path).await;
        }
        written
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "catalog".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()))
    }
}

//=========================================================================================
// "Impure" Storage Record Structs
//=========================================================================================

// Reading is lenient so a hand-edited file with partial records still loads:
// absent text reads as empty, numbers may be numeric strings and missing
// timestamps fall back to the Unix epoch. Only a file that is not a JSON array
// of objects is rejected.

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    title: String,
    #[serde(default, deserialize_with = "lenient_number")]
    price: f64,
    #[serde(default, deserialize_with = "lenient_text")]
    description: String,
    #[serde(default, deserialize_with = "lenient_text")]
    category: String,
    #[serde(default, deserialize_with = "lenient_text")]
    image_url: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_reviews")]
    reviews: Vec<ReviewRecord>,
    #[serde(default, skip_deserializing)]
    ratings: f64,
    #[serde(default, skip_deserializing)]
    num_of_reviews: usize,
}
impl ProductRecord {
    fn from_domain(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            title: product.title.clone(),
            price: product.price,
            description: product.description.clone(),
            category: product.category.clone(),
            image_url: product.image_url.clone(),
            created_at: Some(product.created_at),
            updated_at: Some(product.updated_at),
            reviews: product.reviews.iter().map(ReviewRecord::from_domain).collect(),
            ratings: product.ratings,
            num_of_reviews: product.num_of_reviews,
        }
    }

    /// The stored aggregates are discarded and re-derived, so a hand-edited
    /// file cannot disagree with its own reviews.
    fn to_domain(self) -> Product {
        let created_at = self.created_at.unwrap_or_default();
        let mut product = Product {
            id: self.id,
            title: self.title,
            description: self.description,
            category: self.category,
            image_url: self.image_url,
            price: self.price,
            reviews: self.reviews.into_iter().map(|r| r.to_domain()).collect(),
            ratings: 0.0,
            num_of_reviews: 0,
            created_at,
            updated_at: self.updated_at.unwrap_or(created_at),
        };
        product.refresh_rating_summary();
        product
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    user: String,
    #[serde(default, deserialize_with = "lenient_text")]
    name: String,
    #[serde(default, deserialize_with = "lenient_number")]
    rating: f64,
    #[serde(default, deserialize_with = "lenient_text")]
    comment: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    created_at: Option<DateTime<Utc>>,
}
impl ReviewRecord {
    fn from_domain(review: &Review) -> Self {
        Self {
            id: review.id.clone(),
            user: review.user.clone(),
            name: review.name.clone(),
            rating: review.rating,
            comment: review.comment.clone(),
            created_at: Some(review.created_at),
        }
    }

    fn to_domain(self) -> Review {
        Review {
            id: self.id,
            user: self.user,
            name: self.name,
            rating: self.rating,
            comment: self.comment,
            created_at: self.created_at.unwrap_or_default(),
        }
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => text,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

/// Numbers or numeric strings; anything else reads as `0`.
fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.filter(|n| n.is_finite()).unwrap_or(0.0))
}

/// RFC 3339 strings or epoch milliseconds; anything else is treated as absent.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Some(Value::Number(n)) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    })
}

fn lenient_reviews<'de, D>(deserializer: D) -> Result<Vec<ReviewRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<ReviewRecord>>::deserialize(deserializer)?.unwrap_or_default())
}

/// JSON cannot represent NaN or infinity; serde_json writes them as `null`.
fn has_non_finite_number(product: &Product) -> bool {
    !product.price.is_finite()
        || !product.ratings.is_finite()
        || product.reviews.iter().any(|r| !r.rating.is_finite())
}

//=========================================================================================
// `CatalogStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CatalogStore for JsonFileStore {
    async fn load(&self) -> Vec<Product> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Catalog file {} does not exist yet", self.path.display());
                return Vec::new();
            }
            Err(e) => {
                warn!(
                    "Catalog file {} is unreadable, serving an empty catalog: {}",
                    self.path.display(),
                    e
                );
                return Vec::new();
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            debug!("Catalog file {} is empty", self.path.display());
            return Vec::new();
        }

        match serde_json::from_slice::<Vec<ProductRecord>>(&bytes) {
            Ok(records) => records.into_iter().map(|r| r.to_domain()).collect(),
            Err(e) => {
                warn!(
                    "Catalog file {} is malformed, serving an empty catalog: {}",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    async fn save(&self, products: &[Product]) -> PortResult<()> {
        if let Some(product) = products.iter().find(|p| has_non_finite_number(p)) {
            return Err(PortError::StorageWrite(format!(
                "Product {} holds a number that cannot be stored as JSON",
                product.id
            )));
        }
        let records: Vec<ProductRecord> = products.iter().map(ProductRecord::from_domain).collect();
        let json = serde_json::to_vec_pretty(&records)
            .map_err(|e| PortError::StorageWrite(e.to_string()))?;

        self.write_replacing(&json).await.map_err(|e| {
            PortError::StorageWrite(format!("{}: {}", self.path.display(), e))
        })?;
        debug!(
            "Wrote {} products to {}",
            products.len(),
            self.path.display()
        );
        Ok(())
    }
}
