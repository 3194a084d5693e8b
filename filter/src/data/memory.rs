//! Fixture-backed property service
//!
//! Serves one property set to every space and sanitizes values the same way
//! the object store's property service does. Used by the CLI and tests.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::filters::FilterValue;
use crate::utils::string::parse_bool;
use crate::utils::time::parse_date_to_unix;

use super::property::{Property, PropertyFormat, PropertySnapshot, ValueFamily};
use super::traits::{PropertyError, PropertyService};

/// On-disk fixture: property definitions plus known identifiers per relation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyFixture {
    pub properties: Vec<Property>,
    /// Known identifiers keyed by relation key; relations without an entry
    /// accept any non-empty identifier
    #[serde(default)]
    pub references: HashMap<String, Vec<String>>,
}

impl PropertyFixture {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read properties file: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse properties file: {}", path.display()))
    }
}

/// [`PropertyService`] over a static fixture
#[derive(Debug, Clone)]
pub struct InMemoryPropertyService {
    snapshot: Arc<PropertySnapshot>,
    references: HashMap<String, HashSet<String>>,
}

impl InMemoryPropertyService {
    pub fn new(fixture: PropertyFixture) -> Self {
        let references = fixture
            .references
            .into_iter()
            .map(|(relation_key, ids)| (relation_key, ids.into_iter().collect()))
            .collect();
        Self {
            snapshot: Arc::new(PropertySnapshot::new(fixture.properties)),
            references,
        }
    }

    pub fn from_properties(properties: impl IntoIterator<Item = Property>) -> Self {
        Self::new(PropertyFixture {
            properties: properties.into_iter().collect(),
            references: HashMap::new(),
        })
    }

    fn sanitize_identifier(
        &self,
        key: &str,
        relation_key: &str,
        raw: &Value,
    ) -> Result<String, PropertyError> {
        let id = raw
            .as_str()
            .map(str::trim)
            .ok_or_else(|| invalid(format!("property {key:?} must contain identifier strings")))?;
        if id.is_empty() {
            return Err(invalid(format!("property {key:?} contains an empty identifier")));
        }
        if let Some(known) = self.references.get(relation_key)
            && !known.contains(id)
        {
            return Err(invalid(format!("invalid reference for {key:?}: {id}")));
        }
        Ok(id.to_string())
    }

    fn sanitize_identifiers(
        &self,
        key: &str,
        format: PropertyFormat,
        relation_key: &str,
        raw: &Value,
    ) -> Result<FilterValue, PropertyError> {
        match raw {
            Value::Array(items) => items
                .iter()
                .map(|item| self.sanitize_identifier(key, relation_key, item).map(FilterValue::String))
                .collect::<Result<Vec<_>, _>>()
                .map(FilterValue::List),
            scalar => {
                let id = FilterValue::String(self.sanitize_identifier(key, relation_key, scalar)?);
                if format == PropertyFormat::MultiSelect {
                    Ok(id.into_list())
                } else {
                    Ok(id)
                }
            }
        }
    }
}

fn invalid(reason: String) -> PropertyError {
    PropertyError::InvalidValue(reason)
}

fn sanitize_scalar(
    key: &str,
    format: PropertyFormat,
    raw: &Value,
) -> Result<FilterValue, PropertyError> {
    match format.family() {
        ValueFamily::Text => raw
            .as_str()
            .map(|s| FilterValue::String(s.trim().to_string()))
            .ok_or_else(|| invalid(format!("property {key:?} must be a string"))),
        ValueFamily::Number => {
            let number = match raw {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            number
                .filter(|n| n.is_finite())
                .map(FilterValue::Number)
                .ok_or_else(|| invalid(format!("property {key:?} must be a number")))
        }
        ValueFamily::Checkbox => {
            let flag = match raw {
                Value::Bool(b) => Some(*b),
                Value::String(s) => parse_bool(s),
                _ => None,
            };
            flag.map(FilterValue::Bool)
                .ok_or_else(|| invalid(format!("property {key:?} must be a boolean")))
        }
        ValueFamily::Date => {
            let text = raw.as_str().ok_or_else(|| {
                invalid(format!(
                    "property {key:?} must be a date string (RFC3339 or YYYY-MM-DD)"
                ))
            })?;
            parse_date_to_unix(text)
                .map(FilterValue::Number)
                .ok_or_else(|| invalid(format!("invalid date format for {key:?}: {}", text.trim())))
        }
        ValueFamily::Identifiers => Err(PropertyError::Internal(format!(
            "format {format} is not scalar"
        ))),
    }
}

#[async_trait]
impl PropertyService for InMemoryPropertyService {
    async fn get_cached_properties(
        &self,
        space_id: &str,
    ) -> Result<Arc<PropertySnapshot>, PropertyError> {
        tracing::debug!(space_id, properties = self.snapshot.len(), "Serving property snapshot");
        Ok(Arc::clone(&self.snapshot))
    }

    async fn sanitize_and_validate_property_value(
        &self,
        _space_id: &str,
        key: &str,
        format: PropertyFormat,
        raw: &Value,
        property: &Property,
        _snapshot: &PropertySnapshot,
    ) -> Result<FilterValue, PropertyError> {
        if format.family() == ValueFamily::Identifiers {
            return self.sanitize_identifiers(key, format, &property.relation_key, raw);
        }
        match raw {
            Value::Array(items) => items
                .iter()
                .map(|item| sanitize_scalar(key, format, item))
                .collect::<Result<Vec<_>, _>>()
                .map(FilterValue::List),
            scalar => sanitize_scalar(key, format, scalar),
        }
    }
}
