//! Filter compilation
//!
//! Two request dialects (URL query parameters and JSON expression bodies)
//! are parsed into [`FilterItem`]s, validated against a property snapshot and
//! emitted as backend [`FilterNode`] trees.

pub mod catalog;
pub mod emitter;
pub mod error;
pub mod expression;
pub mod query;
pub mod service;
pub mod sort;
pub mod types;
pub mod validator;

pub use emitter::{combine, emit_expression, emit_item, emit_items};
pub use error::{ErrorKind, FilterError};
pub use expression::{ExpressionLimits, ExpressionParser};
pub use query::{QueryDefaults, QueryParser, query_pairs};
pub use service::FilterService;
pub use sort::{SortDirection, SortOptions, SortProperty};
pub use types::{
    Condition, FilterExpression, FilterItem, FilterNode, FilterValue, Identifiers,
    InternalCondition, ItemValue, Operator, QueryValue, TypedValue,
};
pub use validator::{ValidatedExpression, ValidatedItem, Validator};
