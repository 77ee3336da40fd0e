//! Products

use std::{collections::BTreeMap, fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

/// Product tags
pub type Tags = SmallVec<[String; 4]>;

/// Technical specification values keyed by spec name (e.g. `voltage` -> `"5"`)
pub type Attributes = BTreeMap<String, String>;

/// Certification flags keyed by certification name (e.g. `rohs` -> `true`)
pub type Certifications = BTreeMap<String, bool>;

/// Product identifier shared by the static catalog and the override table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a product id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Unknown lifecycle value.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown lifecycle state: {0}")]
pub struct UnknownLifecycle(pub String);

/// Where a product sits in its commercial lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    /// Recently introduced
    New,

    /// In regular production
    Active,

    /// Not recommended for new designs
    Nrnd,

    /// End of life; sold while stock lasts
    Eol,
}

impl Lifecycle {
    /// Wire name of the lifecycle state.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Active => "active",
            Self::Nrnd => "nrnd",
            Self::Eol => "eol",
        }
    }
}

impl FromStr for Lifecycle {
    type Err = UnknownLifecycle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "active" => Ok(Self::Active),
            "nrnd" => Ok(Self::Nrnd),
            "eol" => Ok(Self::Eol),
            _ => Err(UnknownLifecycle(s.to_string())),
        }
    }
}

/// The merged, externally visible product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalProduct {
    /// Product id
    pub id: ProductId,

    /// Display name
    pub name: String,

    /// URL slug
    pub slug: String,

    /// Long description
    pub description: String,

    /// Stock keeping unit
    pub sku: String,

    /// Category slug
    pub category: String,

    /// Brand name
    pub brand: String,

    /// Lifecycle state
    pub lifecycle: Lifecycle,

    /// Whether the product is promoted on listing pages
    pub featured: bool,

    /// Inactive products are hidden from listings but still resolvable by id
    pub active: bool,

    /// Base price in TRY, before discounts
    pub price: Decimal,

    /// Units on hand
    pub stock: i64,

    /// Free-form tags
    pub tags: Tags,

    /// Technical specification values
    pub attributes: Attributes,

    /// Certification flags
    pub certifications: Certifications,
}

impl CanonicalProduct {
    /// Whether at least one unit is on hand.
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Look up a spec value by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Whether the product carries the given certification.
    pub fn is_certified(&self, certification: &str) -> bool {
        self.certifications.get(certification).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_parses_case_insensitively() {
        assert_eq!("NRND".parse::<Lifecycle>(), Ok(Lifecycle::Nrnd));
        assert_eq!(" eol ".parse::<Lifecycle>(), Ok(Lifecycle::Eol));
    }

    #[test]
    fn lifecycle_rejects_unknown_values() {
        assert_eq!(
            "retired".parse::<Lifecycle>(),
            Err(UnknownLifecycle("retired".to_string()))
        );
    }

    #[test]
    fn product_ids_order_lexicographically() {
        let mut ids = vec![ProductId::from("prd-0003"), ProductId::from("prd-0001")];
        ids.sort();

        assert_eq!(ids, vec![ProductId::from("prd-0001"), ProductId::from("prd-0003")]);
    }
}
