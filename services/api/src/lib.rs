//! services/api/src/lib.rs
//!
//! The HTTP service around the catalog core: configuration, the JSON file
//! store adapter and the web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
