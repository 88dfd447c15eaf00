use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{CalorieCategory, Product, ProductRow};
use super::seed::STATIC_PRODUCTS;
use crate::store::{Disconnected, StoreError, StoreResult};

#[async_trait]
pub trait ProductSource: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> StoreResult<Vec<Product>>;
    async fn list_all(&self) -> StoreResult<Vec<Product>>;
    async fn list_by_brand(&self, brand: &str) -> StoreResult<Vec<Product>>;
    async fn list_by_category(&self, category: CalorieCategory) -> StoreResult<Vec<Product>>;
}

const PRODUCT_COLUMNS: &str =
    "id, name, brand, description, calories, sweetness, size, ingredients, rating, category, image_url";

#[derive(Clone)]
pub struct PgProductSource {
    db: PgPool,
}

impl PgProductSource {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn fetch(&self, sql: String, bind: Option<String>) -> StoreResult<Vec<Product>> {
        let mut q = sqlx::query_as::<_, ProductRow>(&sql);
        if let Some(b) = bind {
            q = q.bind(b);
        }
        let rows = q.fetch_all(&self.db).await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }
}

#[async_trait]
impl ProductSource for PgProductSource {
    async fn search(&self, query: &str, limit: usize) -> StoreResult<Vec<Product>> {
        let pattern = format!("%{}%", escape_like(query.trim()));
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE name ILIKE $1 OR brand ILIKE $1 OR description ILIKE $1
            ORDER BY id
            LIMIT $2
            "#
        ))
        .bind(pattern)
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn list_all(&self) -> StoreResult<Vec<Product>> {
        self.fetch(format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"), None)
            .await
    }

    async fn list_by_brand(&self, brand: &str) -> StoreResult<Vec<Product>> {
        self.fetch(
            format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE lower(brand) = lower($1) ORDER BY id"),
            Some(brand.to_string()),
        )
        .await
    }

    async fn list_by_category(&self, category: CalorieCategory) -> StoreResult<Vec<Product>> {
        self.fetch(
            format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE category = $1 ORDER BY id"),
            Some(category.as_str().to_string()),
        )
        .await
    }
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

/// The compiled-in catalog. Never fails.
#[derive(Clone, Default)]
pub struct StaticCatalog;

#[async_trait]
impl ProductSource for StaticCatalog {
    async fn search(&self, query: &str, limit: usize) -> StoreResult<Vec<Product>> {
        Ok(super::matcher::search(query, &STATIC_PRODUCTS, limit))
    }

    async fn list_all(&self) -> StoreResult<Vec<Product>> {
        Ok(STATIC_PRODUCTS.clone())
    }

    async fn list_by_brand(&self, brand: &str) -> StoreResult<Vec<Product>> {
        Ok(STATIC_PRODUCTS
            .iter()
            .filter(|p| p.brand.eq_ignore_ascii_case(brand))
            .cloned()
            .collect())
    }

    async fn list_by_category(&self, category: CalorieCategory) -> StoreResult<Vec<Product>> {
        Ok(STATIC_PRODUCTS
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProductSource for Disconnected {
    async fn search(&self, _query: &str, _limit: usize) -> StoreResult<Vec<Product>> {
        Err(StoreError::NotConnected)
    }
    async fn list_all(&self) -> StoreResult<Vec<Product>> {
        Err(StoreError::NotConnected)
    }
    async fn list_by_brand(&self, _brand: &str) -> StoreResult<Vec<Product>> {
        Err(StoreError::NotConnected)
    }
    async fn list_by_category(&self, _category: CalorieCategory) -> StoreResult<Vec<Product>> {
        Err(StoreError::NotConnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[tokio::test]
    async fn static_catalog_filters_by_brand_and_category() {
        let cat = StaticCatalog;
        let heytea = cat.list_by_brand("heytea").await.unwrap();
        assert!(!heytea.is_empty());
        assert!(heytea.iter().all(|p| p.brand == "HEYTEA"));

        let low = cat.list_by_category(CalorieCategory::Low).await.unwrap();
        assert!(low.iter().all(|p| p.category == CalorieCategory::Low));
    }
}
