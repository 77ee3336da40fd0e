//! Catalog
//!
//! The canonical product view is the static, code-defined catalog with a persisted override
//! layer folded over it.

pub mod entries;
pub mod overrides;
pub mod resolver;

pub use entries::{CatalogLoadError, StaticCatalog, StaticCatalogEntry};
pub use overrides::{OverrideError, OverrideFields, OverrideSet, Patch, ProductOverride};
pub use resolver::{CatalogError, CatalogResolver};
