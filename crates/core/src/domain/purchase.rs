use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;

#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

/// Purchase data loaded fresh for one recommendation request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PurchaseHistory {
    pub user: UserId,
    /// Products the requesting user has already bought.
    pub own: BTreeSet<ProductId>,
    /// Every user's purchased products, the requesting user included.
    pub all: BTreeMap<UserId, BTreeSet<ProductId>>,
}

impl PurchaseHistory {
    pub fn is_cold_start(&self) -> bool {
        self.own.is_empty()
    }

    /// Other users whose purchases overlap the requesting user's, with the overlap size.
    pub fn overlapping_users(&self) -> impl Iterator<Item = (&BTreeSet<ProductId>, u64)> + '_ {
        self.all.iter().filter(|(user, _)| **user != self.user).filter_map(|(_, products)| {
            let overlap = products.intersection(&self.own).count() as u64;
            (overlap > 0).then_some((products, overlap))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::{PurchaseHistory, UserId};
    use crate::domain::product::ProductId;

    fn ids(values: &[i64]) -> BTreeSet<ProductId> {
        values.iter().copied().map(ProductId).collect()
    }

    #[test]
    fn overlapping_users_skip_requester_and_disjoint_buyers() {
        let user = UserId::new("u1");
        let mut all = BTreeMap::new();
        all.insert(user.clone(), ids(&[1, 2]));
        all.insert(UserId::new("u2"), ids(&[1, 2, 3]));
        all.insert(UserId::new("u3"), ids(&[4, 5]));
        all.insert(UserId::new("u4"), ids(&[2, 6]));

        let history = PurchaseHistory { user, own: ids(&[1, 2]), all };
        let overlaps: Vec<u64> = history.overlapping_users().map(|(_, overlap)| overlap).collect();

        assert_eq!(overlaps, vec![2, 1]);
        assert!(!history.is_cold_start());
    }
}
