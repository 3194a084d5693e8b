//! Property service trait
//!
//! The filter pipeline never owns property definitions; it reads them through
//! a [`PropertyService`]. Implementations handle their own caching and I/O.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::filters::FilterValue;

use super::property::{Property, PropertyFormat, PropertySnapshot};

/// Error reported by a property service
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropertyError {
    /// The raw value cannot be coerced to the property format
    #[error("{0}")]
    InvalidValue(String),

    #[error("cancelled")]
    Cancelled,

    #[error("{0}")]
    Internal(String),
}

/// Source of property definitions and value sanitization for a space
#[async_trait]
pub trait PropertyService: Send + Sync {
    /// Current property definitions of a space
    async fn get_cached_properties(
        &self,
        space_id: &str,
    ) -> Result<Arc<PropertySnapshot>, PropertyError>;

    /// Relation key for a user-visible key or a relation key
    fn resolve_property_api_key(
        &self,
        snapshot: &PropertySnapshot,
        user_or_internal: &str,
    ) -> Option<String> {
        snapshot
            .resolve_relation_key(user_or_internal)
            .map(str::to_string)
    }

    /// Coerce a raw value to the representation of `format`
    async fn sanitize_and_validate_property_value(
        &self,
        space_id: &str,
        key: &str,
        format: PropertyFormat,
        raw: &Value,
        property: &Property,
        snapshot: &PropertySnapshot,
    ) -> Result<FilterValue, PropertyError>;
}
