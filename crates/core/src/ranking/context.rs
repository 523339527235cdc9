use std::collections::{BTreeSet, HashMap};

use crate::domain::product::{ProductCandidate, ProductId};
use crate::domain::purchase::PurchaseHistory;

/// Per-request personalization inputs for hybrid scoring.
///
/// Built once from the loaded history and read by the scorer for every
/// candidate; nothing here outlives the request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserSignalContext {
    purchased: BTreeSet<ProductId>,
    categories: BTreeSet<String>,
    tags: BTreeSet<String>,
    co_purchase: HashMap<ProductId, u64>,
    popularity: HashMap<ProductId, u64>,
}

impl UserSignalContext {
    /// `purchased_products` are the catalog records behind `history.own`.
    pub fn build(
        history: &PurchaseHistory,
        purchased_products: &[ProductCandidate],
        popularity: HashMap<ProductId, u64>,
    ) -> Self {
        // Each overlapping user adds the overlap size to every product they
        // bought that the requester has not.
        let mut co_purchase: HashMap<ProductId, u64> = HashMap::new();
        for (products, overlap) in history.overlapping_users() {
            for product_id in products.difference(&history.own) {
                *co_purchase.entry(*product_id).or_insert(0) += overlap;
            }
        }

        let owned =
            purchased_products.iter().filter(|product| history.own.contains(&product.id));
        let mut categories = BTreeSet::new();
        let mut tags = BTreeSet::new();
        for product in owned {
            categories.insert(product.category.clone());
            tags.extend(product.tags.iter().cloned());
        }

        Self { purchased: history.own.clone(), categories, tags, co_purchase, popularity }
    }

    pub fn has_purchased(&self, product_id: &ProductId) -> bool {
        self.purchased.contains(product_id)
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.contains(category)
    }

    pub fn shared_tag_count(&self, tags: &BTreeSet<String>) -> usize {
        tags.intersection(&self.tags).count()
    }

    pub fn co_purchase_affinity(&self, product_id: &ProductId) -> u64 {
        self.co_purchase.get(product_id).copied().unwrap_or(0)
    }

    pub fn units_sold(&self, product_id: &ProductId) -> u64 {
        self.popularity.get(product_id).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet, HashMap};

    use rust_decimal::Decimal;

    use super::UserSignalContext;
    use crate::domain::product::{ProductCandidate, ProductId};
    use crate::domain::purchase::{PurchaseHistory, UserId};

    fn ids(values: &[i64]) -> BTreeSet<ProductId> {
        values.iter().copied().map(ProductId).collect()
    }

    #[test]
    fn co_purchase_counts_accumulate_overlap_sizes() {
        let user = UserId::new("alice");
        let mut all = BTreeMap::new();
        all.insert(user.clone(), ids(&[1, 2]));
        // overlaps on 1 and 2
        all.insert(UserId::new("bob"), ids(&[1, 2, 3]));
        // overlaps on 2
        all.insert(UserId::new("carol"), ids(&[2, 3, 4]));
        // no overlap
        all.insert(UserId::new("dave"), ids(&[4, 5]));
        let history = PurchaseHistory { user, own: ids(&[1, 2]), all };

        let context = UserSignalContext::build(&history, &[], HashMap::new());

        assert_eq!(context.co_purchase_affinity(&ProductId(3)), 3);
        assert_eq!(context.co_purchase_affinity(&ProductId(4)), 1);
        assert_eq!(context.co_purchase_affinity(&ProductId(5)), 0);
        assert_eq!(context.co_purchase_affinity(&ProductId(1)), 0);
        assert!(context.has_purchased(&ProductId(2)));
    }

    #[test]
    fn content_profile_comes_from_owned_products_only() {
        let user = UserId::new("alice");
        let history = PurchaseHistory {
            user: user.clone(),
            own: ids(&[1]),
            all: BTreeMap::from([(user, ids(&[1]))]),
        };
        let owned = ProductCandidate::new(1, "Gold Ring", "jewelery", Decimal::new(9900, 2))
            .with_tags("gold,gift");
        let stray = ProductCandidate::new(9, "Laptop", "electronics", Decimal::new(99900, 2))
            .with_tags("tech");

        let context = UserSignalContext::build(&history, &[owned, stray], HashMap::new());

        assert!(context.has_category("jewelery"));
        assert!(!context.has_category("electronics"));
        assert_eq!(context.shared_tag_count(&ProductCandidate::parse_tags("gift,silver")), 1);
        assert_eq!(context.shared_tag_count(&ProductCandidate::parse_tags("tech")), 0);
    }
}
