//! Search filters and query-string parsing

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    str::FromStr,
};

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::products::{Lifecycle, UnknownLifecycle};

/// Default number of items per page
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size a query may request; larger values are clamped
pub const MAX_PAGE_SIZE: u32 = 100;

/// Certifications that can be used as search flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Certification {
    /// Restriction of Hazardous Substances
    Rohs,

    /// EU chemical registration
    Reach,

    /// CE marking
    Ce,

    /// Ingress protection rating
    Ip,
}

impl Certification {
    /// Every filterable certification
    pub const ALL: [Self; 4] = [Self::Rohs, Self::Reach, Self::Ce, Self::Ip];

    /// Key used both in query strings and in product certification maps.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rohs => "rohs",
            Self::Reach => "reach",
            Self::Ce => "ce",
            Self::Ip => "ip",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|cert| cert.as_str() == key)
    }
}

impl fmt::Display for Certification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constraint on one technical spec.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecFilter {
    /// Inclusive lower bound on the numeric value
    pub min: Option<Decimal>,

    /// Inclusive upper bound on the numeric value
    pub max: Option<Decimal>,

    /// Required value, compared after normalisation
    pub exact: Option<String>,
}

impl SpecFilter {
    /// Whether the filter needs a numeric attribute value.
    pub const fn is_range(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }
}

/// Facets to narrow the resolved catalog by. Every set field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    /// Free-text query
    pub text: Option<String>,

    /// Category slug
    pub category: Option<String>,

    /// Brand name
    pub brand: Option<String>,

    /// Inclusive lower bound on the effective price
    pub price_min: Option<Decimal>,

    /// Inclusive upper bound on the effective price
    pub price_max: Option<Decimal>,

    /// Accepted lifecycle states; empty accepts all
    pub lifecycle: BTreeSet<Lifecycle>,

    /// Only products with stock on hand
    pub in_stock: bool,

    /// Featured flag
    pub featured: Option<bool>,

    /// Constraints keyed by spec name
    pub specs: BTreeMap<String, SpecFilter>,

    /// Certifications the product must carry
    pub certifications: BTreeSet<Certification>,
}

impl SearchFilter {
    /// Whether the filter constrains the effective price.
    pub const fn has_price_range(&self) -> bool {
        self.price_min.is_some() || self.price_max.is_some()
    }

    fn spec_mut(&mut self, name: &str) -> &mut SpecFilter {
        self.specs.entry(name.to_string()).or_default()
    }

    fn check_ranges(&self) -> Result<(), FilterError> {
        check_range("price", self.price_min, self.price_max)?;

        for (name, spec) in &self.specs {
            check_range(name, spec.min, spec.max)?;
        }

        Ok(())
    }
}

/// 1-indexed page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    page_size: u32,
}

impl Pagination {
    /// Validate a page selection. Page sizes above [`MAX_PAGE_SIZE`] are clamped.
    ///
    /// # Errors
    ///
    /// - [`FilterError::ZeroPage`]: `page` is 0.
    /// - [`FilterError::ZeroPageSize`]: `page_size` is 0.
    pub fn new(page: u32, page_size: u32) -> Result<Self, FilterError> {
        if page == 0 {
            return Err(FilterError::ZeroPage);
        }

        if page_size == 0 {
            return Err(FilterError::ZeroPageSize);
        }

        Ok(Self {
            page,
            page_size: page_size.min(MAX_PAGE_SIZE),
        })
    }

    /// Page number, starting at 1
    pub const fn page(self) -> u32 {
        self.page
    }

    /// Items per page
    pub const fn page_size(self) -> u32 {
        self.page_size
    }

    /// Number of items before this page.
    pub fn offset(self) -> usize {
        let skipped = u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size);

        usize::try_from(skipped).unwrap_or(usize::MAX)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Malformed search parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    /// A numeric parameter did not parse
    #[error("parameter {key} must be a number, got {value:?}")]
    InvalidNumber {
        /// Query key
        key: String,
        /// Raw value
        value: String,
    },

    /// A boolean parameter was neither `true` nor `false`
    #[error("parameter {key} must be true or false, got {value:?}")]
    InvalidBool {
        /// Query key
        key: String,
        /// Raw value
        value: String,
    },

    /// A page parameter was not a positive integer
    #[error("parameter {key} must be a positive integer, got {value:?}")]
    InvalidInteger {
        /// Query key
        key: String,
        /// Raw value
        value: String,
    },

    /// Lifecycle value outside the known states
    #[error(transparent)]
    UnknownLifecycle(#[from] UnknownLifecycle),

    /// Lower bound above upper bound
    #[error("{name} range is inverted: min {min} is greater than max {max}")]
    InvertedRange {
        /// Price or spec name
        name: String,
        /// Lower bound
        min: Decimal,
        /// Upper bound
        max: Decimal,
    },

    /// Page numbers start at 1
    #[error("page must be at least 1")]
    ZeroPage,

    /// Page size must be at least 1
    #[error("page size must be at least 1")]
    ZeroPageSize,
}

/// A parsed search request: the filter plus the page to return.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    /// Facets
    pub filter: SearchFilter,

    /// Page selection
    pub pagination: Pagination,
}

impl SearchQuery {
    /// Build a query from raw query-string pairs.
    ///
    /// Unknown keys and empty values are ignored. When a key repeats, the last value wins,
    /// except `lifecycle`, whose values accumulate.
    ///
    /// # Errors
    ///
    /// Returns a [`FilterError`] for malformed numbers or booleans, unknown lifecycle
    /// states, inverted ranges and zero page numbers or sizes.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filter = SearchFilter::default();
        let mut page = 1;
        let mut page_size = DEFAULT_PAGE_SIZE;

        for (key, value) in pairs {
            let key = key.as_ref().trim();
            let value = value.as_ref().trim();

            if value.is_empty() {
                continue;
            }

            match key {
                "q" => filter.text = Some(value.to_string()),
                "category" => filter.category = Some(value.to_string()),
                "brand" => filter.brand = Some(value.to_string()),
                "price_min" => filter.price_min = Some(parse_decimal(key, value)?),
                "price_max" => filter.price_max = Some(parse_decimal(key, value)?),
                "lifecycle" => {
                    for state in value.split(',').filter(|state| !state.trim().is_empty()) {
                        filter.lifecycle.insert(state.parse()?);
                    }
                }
                "in_stock" => filter.in_stock = parse_bool(key, value)?,
                "featured" => filter.featured = Some(parse_bool(key, value)?),
                "page" => page = parse_positive(key, value)?,
                "page_size" => page_size = parse_positive(key, value)?,
                _ => parse_facet(&mut filter, key, value)?,
            }
        }

        filter.check_ranges()?;

        Ok(Self {
            filter,
            pagination: Pagination::new(page, page_size)?,
        })
    }
}

fn parse_facet(filter: &mut SearchFilter, key: &str, value: &str) -> Result<(), FilterError> {
    if let Some(cert) = Certification::from_key(key) {
        if value == "true" {
            filter.certifications.insert(cert);
        }

        return Ok(());
    }

    if let Some(name) = key.strip_prefix("spec_").filter(|name| !name.is_empty()) {
        filter.spec_mut(name).exact = Some(value.to_string());
    } else if let Some(name) = key.strip_suffix("_min").filter(|name| !name.is_empty()) {
        filter.spec_mut(name).min = Some(parse_decimal(key, value)?);
    } else if let Some(name) = key.strip_suffix("_max").filter(|name| !name.is_empty()) {
        filter.spec_mut(name).max = Some(parse_decimal(key, value)?);
    }

    Ok(())
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, FilterError> {
    value
        .replace(',', ".")
        .parse()
        .map_err(|_err| FilterError::InvalidNumber {
            key: key.to_string(),
            value: value.to_string(),
        })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, FilterError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(FilterError::InvalidBool {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_positive(key: &str, value: &str) -> Result<u32, FilterError> {
    u32::from_str(value).map_err(|_err| FilterError::InvalidInteger {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn check_range(name: &str, min: Option<Decimal>, max: Option<Decimal>) -> Result<(), FilterError> {
    match (min, max) {
        (Some(min), Some(max)) if min > max => Err(FilterError::InvertedRange {
            name: name.to_string(),
            min,
            max,
        }),
        _ => Ok(()),
    }
}
