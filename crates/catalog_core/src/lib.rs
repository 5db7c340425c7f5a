pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    NewProduct, Product, ProductPage, ProductPatch, ProductQuery, Review, ReviewAuthor,
};
pub use ports::{CatalogStore, PortError, PortResult};
pub use service::CatalogService;
