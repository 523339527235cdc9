use serde::Serialize;
use sqlx::{Executor, Row};

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

const EXPECTED_PRODUCTS: i64 = 16;
const EXPECTED_ORDERS: i64 = 5;
const EXPECTED_ORDER_ITEMS: i64 = 12;
const EXPECTED_CATEGORIES: &[&str] =
    &["electronics", "jewelery", "men's clothing", "women's clothing"];

/// Demo catalog with a small order history.
///
/// Covers all four catalog categories so every signal path has something to
/// match, and gives a handful of buyers overlapping baskets for the
/// recommendation path. Re-loading is a no-op.
pub struct DemoSeedDataset;

#[derive(Clone, Debug, Serialize)]
pub struct SeedResult {
    pub products: i64,
    pub orders: i64,
    pub order_items: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct SeedCheck {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct VerificationResult {
    pub checks: Vec<SeedCheck>,
}

impl VerificationResult {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }
}

impl DemoSeedDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_catalog.sql");

    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult {
            products: count(pool, "products").await?,
            orders: count(pool, "orders").await?,
            order_items: count(pool, "order_items").await?,
        })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for (table, expected) in [
            ("products", EXPECTED_PRODUCTS),
            ("orders", EXPECTED_ORDERS),
            ("order_items", EXPECTED_ORDER_ITEMS),
        ] {
            let actual = count(pool, table).await?;
            checks.push(SeedCheck {
                name: format!("{table}_count"),
                passed: actual >= expected,
                detail: format!("expected at least {expected}, found {actual}"),
            });
        }

        let categories: Vec<String> =
            sqlx::query("SELECT DISTINCT category FROM products ORDER BY category")
                .fetch_all(pool)
                .await?
                .iter()
                .map(|row| row.try_get::<String, _>("category"))
                .collect::<Result<_, _>>()?;
        let missing: Vec<&str> = EXPECTED_CATEGORIES
            .iter()
            .copied()
            .filter(|expected| !categories.iter().any(|category| category == expected))
            .collect();
        checks.push(SeedCheck {
            name: "categories_present".to_string(),
            passed: missing.is_empty(),
            detail: if missing.is_empty() {
                format!("{} categories present", categories.len())
            } else {
                format!("missing categories: {}", missing.join(", "))
            },
        });

        let orphaned: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) AS count
            FROM order_items oi
            LEFT JOIN products p ON p.id = oi.product_id
            WHERE p.id IS NULL
            "#,
        )
        .fetch_one(pool)
        .await?
        .try_get("count")?;
        checks.push(SeedCheck {
            name: "order_items_reference_products".to_string(),
            passed: orphaned == 0,
            detail: format!("{orphaned} order lines without a product"),
        });

        Ok(VerificationResult { checks })
    }
}

async fn count(pool: &DbPool, table: &str) -> Result<i64, RepositoryError> {
    let row = sqlx::query(&format!("SELECT COUNT(*) AS count FROM {table}"))
        .fetch_one(pool)
        .await?;
    Ok(row.try_get("count")?)
}
