//! Faceted Search
//!
//! Narrows the resolved catalog by category, brand, lifecycle, featured flag, effective
//! price, numeric and exact spec values, certifications, stock and free text.

pub mod engine;
pub mod filter;
pub mod normalize;

pub use engine::{FacetedSearchEngine, SearchPage};
pub use filter::{
    Certification, DEFAULT_PAGE_SIZE, FilterError, MAX_PAGE_SIZE, Pagination, SearchFilter,
    SearchQuery, SpecFilter,
};
pub use normalize::{normalize, parse_numeric};
