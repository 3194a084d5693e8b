//! Filter validation and property resolution
//!
//! Resolves each parsed leaf against a property snapshot, checks that the
//! condition is legal for the property's format, and sanitizes the value
//! through the [`PropertyService`]. Works the same for both dialects.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::data::{PropertyError, PropertyService, PropertySnapshot};

use super::catalog;
use super::error::FilterError;
use super::types::{FilterExpression, FilterItem, FilterValue, InternalCondition, Operator};

/// Leaf resolved to a relation key with a sanitized value
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedItem {
    pub relation_key: String,
    pub condition: InternalCondition,
    pub value: Option<FilterValue>,
}

/// Expression tree whose leaves have all been validated
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedExpression {
    pub operator: Option<Operator>,
    pub items: Vec<ValidatedItem>,
    pub children: Vec<ValidatedExpression>,
}

/// Run a property service call, giving up when the request is cancelled
async fn until_cancelled<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = Result<T, PropertyError>>,
) -> Result<T, PropertyError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PropertyError::Cancelled),
        result = call => result,
    }
}

#[derive(Clone)]
pub struct Validator {
    service: Arc<dyn PropertyService>,
}

impl Validator {
    pub fn new(service: Arc<dyn PropertyService>) -> Self {
        Self { service }
    }

    /// Fetch the property snapshot used for one request
    pub async fn snapshot(
        &self,
        space_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Arc<PropertySnapshot>, FilterError> {
        until_cancelled(cancel, self.service.get_cached_properties(space_id))
            .await
            .map_err(FilterError::from)
    }

    /// Validate one leaf.
    ///
    /// Fails with `NotFound` when the key resolves to nothing,
    /// `UnsupportedForType` when the condition is illegal for the format and
    /// `InvalidValue` when sanitization rejects the value.
    pub async fn validate(
        &self,
        space_id: &str,
        snapshot: &PropertySnapshot,
        item: &FilterItem,
        cancel: &CancellationToken,
    ) -> Result<ValidatedItem, FilterError> {
        let key = item.property_key.as_str();
        let condition = catalog::internal(item.condition);

        let property = self
            .service
            .resolve_property_api_key(snapshot, key)
            .and_then(|relation_key| snapshot.get_by_relation_key(&relation_key))
            .ok_or_else(|| {
                tracing::warn!(space_id, property_key = key, "Filter property not found");
                FilterError::not_found(key)
            })?;
        let format = property.format;

        if !catalog::is_allowed(format, condition) {
            tracing::warn!(
                space_id,
                property_key = key,
                %condition,
                %format,
                "Condition not supported for property format"
            );
            return Err(FilterError::UnsupportedForType {
                key: key.to_string(),
                condition,
                format,
            });
        }

        if item.condition.is_nil_valued() {
            return Ok(ValidatedItem {
                relation_key: property.relation_key.clone(),
                condition,
                value: None,
            });
        }

        if let Some(tagged) = item.value.tagged_format()
            && tagged.family() != format.family()
        {
            return Err(FilterError::bad_input(format!(
                "value field {:?} does not match format {format} of property {key:?}",
                tagged.as_str()
            )));
        }

        let raw = item.value.to_raw().ok_or_else(|| {
            FilterError::bad_input(format!(
                "condition {} for property {key:?} requires a value",
                item.condition
            ))
        })?;
        let raw = match raw {
            Value::Array(_) => raw,
            scalar if item.condition.is_set() => Value::Array(vec![scalar]),
            scalar => scalar,
        };

        let sanitized = until_cancelled(
            cancel,
            self.service.sanitize_and_validate_property_value(
                space_id, key, format, &raw, property, snapshot,
            ),
        )
        .await
        .map_err(|e| FilterError::from_property(key, e))?;

        let value = if item.condition.is_set() {
            sanitized.into_list()
        } else if sanitized.is_list() && !format.is_list_shaped() {
            return Err(FilterError::invalid_value(
                key,
                format!("condition {} does not accept a list", item.condition),
            ));
        } else {
            sanitized
        };

        tracing::debug!(
            space_id,
            property_key = key,
            relation_key = %property.relation_key,
            %condition,
            "Validated filter condition"
        );

        Ok(ValidatedItem {
            relation_key: property.relation_key.clone(),
            condition,
            value: Some(value),
        })
    }

    /// Validate leaves in order, stopping at the first failure
    pub async fn validate_items(
        &self,
        space_id: &str,
        snapshot: &PropertySnapshot,
        items: &[FilterItem],
        cancel: &CancellationToken,
    ) -> Result<Vec<ValidatedItem>, FilterError> {
        let mut validated = Vec::with_capacity(items.len());
        for item in items {
            validated.push(self.validate(space_id, snapshot, item, cancel).await?);
        }
        Ok(validated)
    }

    /// Validate every leaf of an expression, keeping its shape
    pub async fn validate_expression(
        &self,
        space_id: &str,
        snapshot: &PropertySnapshot,
        expression: &FilterExpression,
        cancel: &CancellationToken,
    ) -> Result<ValidatedExpression, FilterError> {
        let mut leaves = Vec::with_capacity(expression.leaf_count());
        collect_leaves(expression, &mut leaves);
        let validated = self.validate_items(space_id, snapshot, &leaves, cancel).await?;
        Ok(rebuild(expression, &mut validated.into_iter()))
    }
}

/// Leaves in depth-first order: own conditions first, then children
fn collect_leaves(expression: &FilterExpression, leaves: &mut Vec<FilterItem>) {
    leaves.extend(expression.conditions.iter().cloned());
    for child in &expression.filters {
        collect_leaves(child, leaves);
    }
}

/// Reassemble the tree from leaves produced in `collect_leaves` order
fn rebuild(
    expression: &FilterExpression,
    validated: &mut impl Iterator<Item = ValidatedItem>,
) -> ValidatedExpression {
    let items = validated.by_ref().take(expression.conditions.len()).collect();
    let children = expression
        .filters
        .iter()
        .map(|child| rebuild(child, validated))
        .collect();
    ValidatedExpression {
        operator: expression.operator,
        items,
        children,
    }
}
