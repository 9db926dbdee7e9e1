//! Content CRUD and detail-view glue.
//!
//! Thin entry points for the embedding framework's handlers. Each mutation
//! logs one structured event; detail views record the access through the
//! engagement service before loading the full row.

use anyhow::Result;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::common::{ArticleId, ProductId};
use crate::domains::content::models::{
    Article, Category, CreateArticle, CreateCategory, CreateProduct, EditArticle, EditProduct,
    Product,
};
use crate::domains::content::service::{EngagementError, EngagementService};
use crate::domains::content::store::ContentRef;

// ---- Articles ----

/// Detail view: count the access, then load the article. Returns None for
/// an unknown ID (the handler renders its not-found page).
pub async fn view_article(
    id: ArticleId,
    engagement: &EngagementService,
    pool: &PgPool,
) -> Result<Option<Article>> {
    match engagement.record_access(ContentRef::Article(id)).await {
        Ok(_) => Article::find_by_id(id, pool).await,
        Err(EngagementError::NotFound(_)) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

pub async fn list_published_articles(
    limit: i64,
    offset: i64,
    pool: &PgPool,
) -> Result<Vec<Article>> {
    Article::list_published(limit, offset, pool).await
}

pub async fn create_article(input: CreateArticle, pool: &PgPool) -> Result<Article> {
    let article = Article::create(input, pool).await?;
    info!(article_id = %article.id, title = %article.title, "article created");
    Ok(article)
}

pub async fn update_article(
    id: ArticleId,
    changes: EditArticle,
    pool: &PgPool,
) -> Result<Option<Article>> {
    let article = Article::update(id, changes, pool).await?;
    match &article {
        Some(article) => info!(article_id = %article.id, title = %article.title, "article updated"),
        None => warn!(article_id = %id, "article update targeted a missing row"),
    }
    Ok(article)
}

pub async fn delete_article(id: ArticleId, pool: &PgPool) -> Result<bool> {
    let deleted = Article::delete(id, pool).await?;
    if deleted {
        info!(article_id = %id, "article deleted");
    } else {
        warn!(article_id = %id, "article delete targeted a missing row");
    }
    Ok(deleted)
}

// ---- Products ----

/// Detail view: count the access, then load the product.
pub async fn view_product(
    id: ProductId,
    engagement: &EngagementService,
    pool: &PgPool,
) -> Result<Option<Product>> {
    match engagement.record_access(ContentRef::Product(id)).await {
        Ok(_) => Product::find_by_id(id, pool).await,
        Err(EngagementError::NotFound(_)) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

pub async fn list_products(limit: i64, offset: i64, pool: &PgPool) -> Result<Vec<Product>> {
    Product::list(limit, offset, pool).await
}

pub async fn create_product(input: CreateProduct, pool: &PgPool) -> Result<Product> {
    let product = Product::create(input, pool).await?;
    info!(product_id = %product.id, name = %product.name, "product created");
    Ok(product)
}

pub async fn update_product(
    id: ProductId,
    changes: EditProduct,
    pool: &PgPool,
) -> Result<Option<Product>> {
    let product = Product::update(id, changes, pool).await?;
    match &product {
        Some(product) => info!(product_id = %product.id, name = %product.name, "product updated"),
        None => warn!(product_id = %id, "product update targeted a missing row"),
    }
    Ok(product)
}

pub async fn delete_product(id: ProductId, pool: &PgPool) -> Result<bool> {
    let deleted = Product::delete(id, pool).await?;
    if deleted {
        info!(product_id = %id, "product deleted");
    } else {
        warn!(product_id = %id, "product delete targeted a missing row");
    }
    Ok(deleted)
}

// ---- Categories ----

pub async fn create_category(input: CreateCategory, pool: &PgPool) -> Result<Category> {
    let category = Category::create(input, pool).await?;
    info!(category_id = %category.id, name = %category.name, "category created");
    Ok(category)
}

pub async fn list_categories(pool: &PgPool) -> Result<Vec<Category>> {
    Category::list(pool).await
}
