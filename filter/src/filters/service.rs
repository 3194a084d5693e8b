//! Filter compilation pipelines
//!
//! [`FilterService`] wires parsing, validation and emission together so a
//! request handler makes one call per dialect. Each call takes exactly one
//! property snapshot.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::config::FilterConfig;
use crate::data::PropertyService;

use super::emitter::{emit_expression, emit_items};
use super::error::FilterError;
use super::expression::ExpressionParser;
use super::query::QueryParser;
use super::types::{FilterExpression, FilterItem, FilterNode};
use super::validator::Validator;

#[derive(Clone)]
pub struct FilterService {
    query_parser: QueryParser,
    expression_parser: ExpressionParser,
    validator: Validator,
}

impl FilterService {
    pub fn new(service: Arc<dyn PropertyService>, config: &FilterConfig) -> Self {
        Self {
            query_parser: QueryParser::from_config(config),
            expression_parser: ExpressionParser::from_config(config),
            validator: Validator::new(service),
        }
    }

    pub fn query_parser(&self) -> &QueryParser {
        &self.query_parser
    }

    pub fn expression_parser(&self) -> &ExpressionParser {
        &self.expression_parser
    }

    /// Compile a raw URL query string into a flat list of leaves.
    ///
    /// The caller joins the leaves (usually with `and`). No snapshot is taken
    /// when the query carries no filters.
    pub async fn compile_query(
        &self,
        space_id: &str,
        raw_query: &str,
        endpoint: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<FilterNode>, FilterError> {
        let items = self.query_parser.parse(raw_query, endpoint)?;
        self.compile_items(space_id, &items, cancel).await
    }

    /// Validate and emit already parsed query filters
    pub async fn compile_items(
        &self,
        space_id: &str,
        items: &[FilterItem],
        cancel: &CancellationToken,
    ) -> Result<Vec<FilterNode>, FilterError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let snapshot = self.validator.snapshot(space_id, cancel).await?;
        let validated = self
            .validator
            .validate_items(space_id, &snapshot, items, cancel)
            .await?;
        let nodes = emit_items(validated);
        tracing::trace!(space_id, ?nodes, "Emitted query filters");
        Ok(nodes)
    }

    /// Compile a JSON expression body. `None` means "no filter".
    pub async fn compile_expression(
        &self,
        space_id: &str,
        body: &[u8],
        cancel: &CancellationToken,
    ) -> Result<Option<FilterNode>, FilterError> {
        match self.expression_parser.parse_bytes(body)? {
            Some(expression) => {
                self.compile_parsed_expression(space_id, &expression, cancel)
                    .await
            }
            None => Ok(None),
        }
    }

    pub async fn compile_parsed_expression(
        &self,
        space_id: &str,
        expression: &FilterExpression,
        cancel: &CancellationToken,
    ) -> Result<Option<FilterNode>, FilterError> {
        if expression.is_empty() {
            return Ok(None);
        }
        let snapshot = self.validator.snapshot(space_id, cancel).await?;
        let validated = self
            .validator
            .validate_expression(space_id, &snapshot, expression, cancel)
            .await?;
        let node = emit_expression(validated);
        tracing::debug!(
            space_id,
            leaves = expression.leaf_count(),
            depth = node.as_ref().map_or(0, FilterNode::depth),
            "Compiled filter expression"
        );
        tracing::trace!(space_id, ?node, "Emitted filter expression");
        Ok(node)
    }
}
