//! crates/catalog_core/src/ports.rs
//!
//! Defines the storage contract for the catalog.
//! The service only ever talks to this trait, so the backing medium (a JSON
//! file in production, memory in tests) can be swapped freely.

use async_trait::async_trait;

use crate::domain::Product;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error type for every catalog operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Failed to write catalog: {0}")]
    StorageWrite(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Reads the whole catalog in stored order.
    ///
    /// Absent, unreadable or malformed storage yields an empty catalog: the
    /// store may simply not have been initialized yet.
    async fn load(&self) -> Vec<Product>;

    /// Replaces the whole stored catalog with `products`.
    async fn save(&self, products: &[Product]) -> PortResult<()>;
}
