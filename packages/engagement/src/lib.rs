// Content Engagement Core
//
// This crate provides the engagement backend for a content-management
// application: per-entity view accounting for articles and products, a
// threshold-triggered admin notification, and asynchronous mail dispatch.
// The embedding web framework owns routing, rendering, schema, and
// authentication; it consumes this crate as a library.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
