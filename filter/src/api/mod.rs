//! HTTP boundary adapters for filters

pub mod extractors;
pub mod types;

pub use extractors::{FilterBody, FilterEndpoint, QueryFilters};
pub use types::ApiError;
