use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::debug;

use storefront_core::domain::product::{ProductCandidate, ProductId, ProductRating};
use storefront_core::domain::purchase::{PurchaseHistory, UserId};
use storefront_core::ranking::{CandidateLoader, CandidateQuery, LoaderError};

use super::RepositoryError;
use crate::DbPool;

const PRODUCT_COLUMNS: &str = r#"
    SELECT p.id, p.title, p.description, p.price, p.category, p.tags, p.image,
        p.rating_rate, p.rating_count, COALESCE(sold.units_sold, 0) AS units_sold
    FROM products p
    LEFT JOIN (
        SELECT product_id, SUM(quantity) AS units_sold
        FROM order_items
        GROUP BY product_id
    ) sold ON sold.product_id = p.id
    WHERE 1=1"#;

const TERM_SCAN_PAGE: usize = 256;

/// SQLite-backed catalog and order history.
///
/// Category membership and `price <= ceiling` run in SQL; match terms are
/// checked with [`CandidateQuery::matches`] over the filtered rows. Rows
/// come back in catalog order.
pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<ProductCandidate>, RepositoryError> {
        let products = if query.terms.is_empty() {
            self.fetch_filtered(query, None, query.limit).await?
        } else {
            self.scan_for_terms(query).await?
        };

        debug!(
            event_name = "db.catalog.candidates_loaded",
            categories = query.categories.len(),
            terms = query.terms.len(),
            budget = query.budget_ceiling.map(|ceiling| ceiling.to_string()),
            rows = products.len(),
            "candidate query executed"
        );

        Ok(products)
    }

    /// Term matching needs Unicode case folding, which SQLite's `LOWER` and
    /// `LIKE` lack, so rows are paged by id and matched in process.
    async fn scan_for_terms(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<ProductCandidate>, RepositoryError> {
        let mut matched = Vec::new();
        let mut after = None;

        while matched.len() < query.limit {
            let page = self.fetch_filtered(query, after, TERM_SCAN_PAGE).await?;
            let Some(last) = page.last() else {
                break;
            };
            after = Some(last.id);
            let exhausted = page.len() < TERM_SCAN_PAGE;

            matched.extend(page.into_iter().filter(|product| query.matches(product)));
            if exhausted {
                break;
            }
        }

        matched.truncate(query.limit);
        Ok(matched)
    }

    /// Category and budget filters only, in catalog order.
    async fn fetch_filtered(
        &self,
        query: &CandidateQuery,
        after: Option<ProductId>,
        limit: usize,
    ) -> Result<Vec<ProductCandidate>, RepositoryError> {
        let mut builder = QueryBuilder::<Sqlite>::new(PRODUCT_COLUMNS);

        if !query.categories.is_empty() {
            builder.push(" AND p.category IN (");
            let mut separated = builder.separated(", ");
            for name in query.category_names() {
                separated.push_bind(name);
            }
            separated.push_unseparated(")");
        }

        if let Some(ceiling) = query.budget_ceiling {
            builder.push(" AND CAST(p.price AS REAL) <= CAST(");
            builder.push_bind(ceiling.to_string());
            builder.push(" AS REAL)");
        }

        if let Some(after) = after {
            builder.push(" AND p.id > ");
            builder.push_bind(after.0);
        }

        builder.push(" ORDER BY p.id LIMIT ");
        builder.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(decode_product).collect()
    }

    pub async fn find_purchase_history(
        &self,
        user: &UserId,
    ) -> Result<PurchaseHistory, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT o.user_id, oi.product_id
            FROM orders o
            JOIN order_items oi ON oi.order_id = o.id
            ORDER BY o.user_id, oi.product_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut all: BTreeMap<UserId, BTreeSet<ProductId>> = BTreeMap::new();
        for row in rows {
            let buyer: String = row.try_get("user_id")?;
            let product_id: i64 = row.try_get("product_id")?;
            all.entry(UserId(buyer)).or_default().insert(ProductId(product_id));
        }

        let own = all.get(user).cloned().unwrap_or_default();
        debug!(
            event_name = "db.catalog.history_loaded",
            own_products = own.len(),
            buyers = all.len(),
            "purchase history loaded"
        );

        Ok(PurchaseHistory { user: user.clone(), own, all })
    }

    pub async fn find_popularity(&self) -> Result<HashMap<ProductId, u64>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT product_id, SUM(quantity) AS units FROM order_items GROUP BY product_id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let product_id: i64 = row.try_get("product_id")?;
                let units: i64 = row.try_get("units")?;
                Ok((ProductId(product_id), non_negative(units, "units")?))
            })
            .collect()
    }

    pub async fn find_products(
        &self,
        ids: &BTreeSet<ProductId>,
    ) -> Result<Vec<ProductCandidate>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(PRODUCT_COLUMNS);
        builder.push(" AND p.id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.0);
        }
        separated.push_unseparated(") ORDER BY p.id");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(decode_product).collect()
    }
}

#[async_trait]
impl CandidateLoader for SqlCatalogRepository {
    async fn load_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<ProductCandidate>, LoaderError> {
        Ok(self.find_candidates(query).await?)
    }

    async fn load_purchase_history(&self, user: &UserId) -> Result<PurchaseHistory, LoaderError> {
        Ok(self.find_purchase_history(user).await?)
    }

    async fn load_popularity(&self) -> Result<HashMap<ProductId, u64>, LoaderError> {
        Ok(self.find_popularity().await?)
    }

    async fn load_products(
        &self,
        ids: &BTreeSet<ProductId>,
    ) -> Result<Vec<ProductCandidate>, LoaderError> {
        Ok(self.find_products(ids).await?)
    }
}

fn non_negative(value: i64, field: &str) -> Result<u64, RepositoryError> {
    u64::try_from(value)
        .map_err(|_| RepositoryError::Decode(format!("negative value for {field}: {value}")))
}

fn decode_product(row: &SqliteRow) -> Result<ProductCandidate, RepositoryError> {
    let price: String = row.try_get("price")?;
    let price = Decimal::from_str(price.trim()).map_err(|error| {
        RepositoryError::Decode(format!("invalid decimal value for price: {error}"))
    })?;

    let rating_rate: Option<f64> = row.try_get("rating_rate")?;
    let rating_count: Option<i64> = row.try_get("rating_count")?;
    let rating = match (rating_rate, rating_count) {
        (Some(rate), Some(count)) => Some(ProductRating {
            rate,
            count: u32::try_from(count).map_err(|_| {
                RepositoryError::Decode(format!("invalid value for rating_count: {count}"))
            })?,
        }),
        _ => None,
    };

    let tags: Option<String> = row.try_get("tags")?;
    let units_sold: i64 = row.try_get("units_sold")?;

    Ok(ProductCandidate {
        id: ProductId(row.try_get("id")?),
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        price,
        units_sold: non_negative(units_sold, "units_sold")?,
        tags: ProductCandidate::parse_tags(tags.as_deref().unwrap_or_default()),
        image: row.try_get("image")?,
        rating,
    })
}
