use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use storefront_core::domain::product::{ProductCandidate, ProductId};
use storefront_core::domain::purchase::{PurchaseHistory, UserId};
use storefront_core::ranking::{CandidateLoader, CandidateQuery, LoaderError};

#[derive(Clone, Debug)]
struct OrderLine {
    user: UserId,
    product: ProductId,
    quantity: u64,
}

/// Catalog kept in process memory, filtered with [`CandidateQuery::matches`].
#[derive(Default)]
pub struct InMemoryCatalog {
    products: RwLock<BTreeMap<ProductId, ProductCandidate>>,
    orders: RwLock<Vec<OrderLine>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: impl IntoIterator<Item = ProductCandidate>) -> Self {
        let products = products.into_iter().map(|product| (product.id, product)).collect();
        Self { products: RwLock::new(products), orders: RwLock::default() }
    }

    pub async fn save_product(&self, product: ProductCandidate) {
        let mut products = self.products.write().await;
        products.insert(product.id, product);
    }

    pub async fn record_purchase(&self, user: UserId, product: ProductId, quantity: u64) {
        let mut orders = self.orders.write().await;
        orders.push(OrderLine { user, product, quantity });
    }

    async fn units_sold(&self) -> HashMap<ProductId, u64> {
        let orders = self.orders.read().await;
        let mut units = HashMap::new();
        for line in orders.iter() {
            *units.entry(line.product).or_insert(0) += line.quantity;
        }
        units
    }

    fn with_sales(product: &ProductCandidate, units: &HashMap<ProductId, u64>) -> ProductCandidate {
        let sold = units.get(&product.id).copied().unwrap_or(0);
        product.clone().with_units_sold(sold)
    }
}

#[async_trait]
impl CandidateLoader for InMemoryCatalog {
    async fn load_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<ProductCandidate>, LoaderError> {
        let units = self.units_sold().await;
        let products = self.products.read().await;
        Ok(products
            .values()
            .filter(|product| query.matches(product))
            .take(query.limit)
            .map(|product| Self::with_sales(product, &units))
            .collect())
    }

    async fn load_purchase_history(&self, user: &UserId) -> Result<PurchaseHistory, LoaderError> {
        let orders = self.orders.read().await;
        let mut all: BTreeMap<UserId, BTreeSet<ProductId>> = BTreeMap::new();
        for line in orders.iter() {
            all.entry(line.user.clone()).or_default().insert(line.product);
        }
        let own = all.get(user).cloned().unwrap_or_default();
        Ok(PurchaseHistory { user: user.clone(), own, all })
    }

    async fn load_popularity(&self) -> Result<HashMap<ProductId, u64>, LoaderError> {
        Ok(self.units_sold().await)
    }

    async fn load_products(
        &self,
        ids: &BTreeSet<ProductId>,
    ) -> Result<Vec<ProductCandidate>, LoaderError> {
        let units = self.units_sold().await;
        let products = self.products.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| products.get(id))
            .map(|product| Self::with_sales(product, &units))
            .collect())
    }
}
