pub mod actions;
pub mod models;
pub mod service;
pub mod store;

// Re-export models (domain models)
pub use models::{Article, Category, Product};

// Re-export the view-accounting service and port
pub use service::{EngagementError, EngagementService};
pub use store::{BaseContentStore, ContentRef, PgContentStore, StoreError, ViewedContent};
