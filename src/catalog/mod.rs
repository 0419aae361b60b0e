// src/catalog/mod.rs

pub mod refresh;
pub mod store;

pub use store::CatalogStore;
