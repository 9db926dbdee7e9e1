//! Typed ID aliases for the domain entities.

pub use super::id::Id;

/// Marker type for Article entities (blog posts).
pub struct Article;

/// Marker type for Product entities (catalog items).
pub struct Product;

/// Marker type for Category entities (catalog sections).
pub struct Category;

/// Marker type for Member entities (registered users).
pub struct Member;

/// Typed ID for Article entities.
pub type ArticleId = Id<Article>;

/// Typed ID for Product entities.
pub type ProductId = Id<Product>;

/// Typed ID for Category entities.
pub type CategoryId = Id<Category>;

/// Typed ID for Member entities.
pub type MemberId = Id<Member>;
