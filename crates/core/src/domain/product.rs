use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub i64);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductRating {
    pub rate: f64,
    pub count: u32,
}

/// Read-only snapshot of a catalog item handed to the ranking core for one request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductCandidate {
    pub id: ProductId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: String,
    pub price: Decimal,
    /// Unit sales across all order lines.
    #[serde(default)]
    pub units_sold: u64,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<ProductRating>,
}

impl ProductCandidate {
    pub fn new(
        id: i64,
        title: impl Into<String>,
        category: impl Into<String>,
        price: Decimal,
    ) -> Self {
        Self {
            id: ProductId(id),
            title: title.into(),
            description: None,
            category: category.into(),
            price,
            units_sold: 0,
            tags: BTreeSet::new(),
            image: None,
            rating: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags(mut self, raw: &str) -> Self {
        self.tags = Self::parse_tags(raw);
        self
    }

    pub fn with_units_sold(mut self, units_sold: u64) -> Self {
        self.units_sold = units_sold;
        self
    }

    /// Tags are stored as one comma-delimited string and compared as a set.
    pub fn parse_tags(raw: &str) -> BTreeSet<String> {
        raw.split(',')
            .map(|tag| tag.trim().to_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect()
    }

    /// Comma-delimited form used by storage.
    pub fn tags_column(&self) -> String {
        self.tags.iter().cloned().collect::<Vec<_>>().join(",")
    }
}
