//! Filter type definitions
//!
//! Public condition and operator vocabularies, the parsed filter forms of both
//! input dialects, and the backend filter node the emitter produces.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::PropertyFormat;

/// Public condition tokens accepted by both dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    #[serde(rename = "ncontains")]
    NContains,
    In,
    Nin,
    All,
    Empty,
    #[serde(rename = "nempty")]
    NEmpty,
}

impl Condition {
    pub const ALL: [Condition; 13] = [
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::Contains,
        Self::NContains,
        Self::In,
        Self::Nin,
        Self::All,
        Self::Empty,
        Self::NEmpty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Contains => "contains",
            Self::NContains => "ncontains",
            Self::In => "in",
            Self::Nin => "nin",
            Self::All => "all",
            Self::Empty => "empty",
            Self::NEmpty => "nempty",
        }
    }

    /// Conditions whose value is always a list
    pub fn is_set(&self) -> bool {
        matches!(self, Self::In | Self::Nin | Self::All)
    }

    /// Conditions that never carry a value
    pub fn is_nil_valued(&self) -> bool {
        matches!(self, Self::Empty | Self::NEmpty)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|condition| condition.as_str() == s)
            .ok_or(())
    }
}

/// Conditions understood by the object store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum InternalCondition {
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    Like,
    NotLike,
    In,
    NotIn,
    AllIn,
    NotAllIn,
    ExactIn,
    NotExactIn,
    Exists,
    Empty,
    NotEmpty,
}

impl InternalCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "Equal",
            Self::NotEqual => "NotEqual",
            Self::Greater => "Greater",
            Self::GreaterOrEqual => "GreaterOrEqual",
            Self::Less => "Less",
            Self::LessOrEqual => "LessOrEqual",
            Self::Like => "Like",
            Self::NotLike => "NotLike",
            Self::In => "In",
            Self::NotIn => "NotIn",
            Self::AllIn => "AllIn",
            Self::NotAllIn => "NotAllIn",
            Self::ExactIn => "ExactIn",
            Self::NotExactIn => "NotExactIn",
            Self::Exists => "Exists",
            Self::Empty => "Empty",
            Self::NotEmpty => "NotEmpty",
        }
    }
}

impl fmt::Display for InternalCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical connector between filter nodes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    #[default]
    And,
    Or,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "and" => Ok(Self::And),
            "or" => Ok(Self::Or),
            _ => Err(()),
        }
    }
}

/// Value of a query parameter after decoding
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Text(String),
    List(Vec<String>),
    /// Truthiness flag of `empty`/`nempty`
    Flag(bool),
}

/// One identifier or a list of identifiers
#[derive(Debug, Clone, PartialEq)]
pub enum Identifiers {
    One(String),
    Many(Vec<String>),
}

impl Identifiers {
    fn to_json(&self) -> Value {
        match self {
            Self::One(id) => Value::String(id.clone()),
            Self::Many(ids) => Value::Array(ids.iter().cloned().map(Value::String).collect()),
        }
    }
}

/// Format-tagged value of a JSON leaf
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Text(String),
    Url(String),
    Email(String),
    Phone(String),
    Number(f64),
    Date(String),
    Checkbox(bool),
    Select(Identifiers),
    MultiSelect(Vec<String>),
    Files(Identifiers),
    Objects(Identifiers),
}

impl TypedValue {
    pub fn format(&self) -> PropertyFormat {
        match self {
            Self::Text(_) => PropertyFormat::Text,
            Self::Url(_) => PropertyFormat::Url,
            Self::Email(_) => PropertyFormat::Email,
            Self::Phone(_) => PropertyFormat::Phone,
            Self::Number(_) => PropertyFormat::Number,
            Self::Date(_) => PropertyFormat::Date,
            Self::Checkbox(_) => PropertyFormat::Checkbox,
            Self::Select(_) => PropertyFormat::Select,
            Self::MultiSelect(_) => PropertyFormat::MultiSelect,
            Self::Files(_) => PropertyFormat::Files,
            Self::Objects(_) => PropertyFormat::Objects,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Text(s) | Self::Url(s) | Self::Email(s) | Self::Phone(s) | Self::Date(s) => {
                Value::String(s.clone())
            }
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Checkbox(b) => Value::Bool(*b),
            Self::MultiSelect(ids) => {
                Value::Array(ids.iter().cloned().map(Value::String).collect())
            }
            Self::Select(ids) | Self::Files(ids) | Self::Objects(ids) => ids.to_json(),
        }
    }
}

/// Value carried by a parsed leaf
#[derive(Debug, Clone, PartialEq)]
pub enum ItemValue {
    /// `empty`/`nempty` leaf without a format field
    None,
    Query(QueryValue),
    Typed(TypedValue),
}

impl ItemValue {
    /// Raw JSON form handed to the property sanitizer
    pub fn to_raw(&self) -> Option<Value> {
        match self {
            Self::None => None,
            Self::Query(QueryValue::Text(s)) => Some(Value::String(s.clone())),
            Self::Query(QueryValue::List(items)) => Some(Value::Array(
                items.iter().cloned().map(Value::String).collect(),
            )),
            Self::Query(QueryValue::Flag(flag)) => Some(Value::Bool(*flag)),
            Self::Typed(typed) => Some(typed.to_json()),
        }
    }

    /// Format named by the leaf, if it carried one
    pub fn tagged_format(&self) -> Option<PropertyFormat> {
        match self {
            Self::Typed(typed) => Some(typed.format()),
            _ => None,
        }
    }
}

/// Parsed leaf of either dialect
#[derive(Debug, Clone, PartialEq)]
pub struct FilterItem {
    pub property_key: String,
    pub condition: Condition,
    pub value: ItemValue,
}

impl FilterItem {
    pub fn new(property_key: impl Into<String>, condition: Condition, value: ItemValue) -> Self {
        Self {
            property_key: property_key.into(),
            condition,
            value,
        }
    }
}

/// Recursive filter expression of the JSON dialect
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterExpression {
    /// Operator as authored; `None` means the caller did not specify one
    pub operator: Option<Operator>,
    pub conditions: Vec<FilterItem>,
    pub filters: Vec<FilterExpression>,
}

impl FilterExpression {
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.filters.is_empty()
    }

    /// Total number of leaves in the tree
    pub fn leaf_count(&self) -> usize {
        self.conditions.len() + self.filters.iter().map(Self::leaf_count).sum::<usize>()
    }
}

/// Sanitized filter value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    String(String),
    Number(f64),
    Bool(bool),
    List(Vec<FilterValue>),
}

impl FilterValue {
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(|s| Self::String(s.into())).collect())
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Wrap a scalar into a one-element list; lists are returned unchanged
    pub fn into_list(self) -> Self {
        match self {
            Self::List(_) => self,
            scalar => Self::List(vec![scalar]),
        }
    }
}

/// Backend filter node
///
/// A node is either a leaf over one relation or a group of nested nodes; the
/// enum keeps the two shapes from being mixed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterNode {
    Leaf {
        relation_key: String,
        condition: InternalCondition,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<FilterValue>,
    },
    Group {
        operator: Operator,
        nested: Vec<FilterNode>,
    },
}

impl FilterNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }

    /// Depth of the node; a leaf has depth 1
    pub fn depth(&self) -> usize {
        match self {
            Self::Leaf { .. } => 1,
            Self::Group { nested, .. } => 1 + nested.iter().map(Self::depth).max().unwrap_or(0),
        }
    }
}
