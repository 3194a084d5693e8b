//! JSON filter expression parsing
//!
//! Deserializes the recursive `{operator, conditions, filters}` body. Each
//! leaf names its value by format (`"number": 7`, `"checkbox": true`, ...);
//! the parser turns that field into a [`TypedValue`] so a leaf can never hold
//! two values at once.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::core::config::FilterConfig;
use crate::data::PropertyFormat;

use super::error::FilterError;
use super::types::{
    Condition, FilterExpression, FilterItem, Identifiers, ItemValue, Operator, TypedValue,
};

#[derive(Debug, Deserialize)]
struct RawExpression {
    #[serde(default)]
    operator: Option<String>,
    #[serde(default)]
    conditions: Option<Vec<Value>>,
    #[serde(default)]
    filters: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct RawLeaf {
    property_key: String,
    condition: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

/// Limits applied while parsing a body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpressionLimits {
    pub max_body_bytes: usize,
    pub max_depth: usize,
    pub max_conditions: usize,
}

/// Parser for the JSON expression dialect
#[derive(Debug, Clone)]
pub struct ExpressionParser {
    limits: ExpressionLimits,
}

impl Default for ExpressionParser {
    fn default() -> Self {
        Self::from_config(&FilterConfig::default())
    }
}

impl ExpressionParser {
    pub fn new(limits: ExpressionLimits) -> Self {
        Self { limits }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(ExpressionLimits {
            max_body_bytes: config.limits.max_body_bytes,
            max_depth: config.limits.max_depth,
            max_conditions: config.limits.max_conditions,
        })
    }

    pub fn limits(&self) -> ExpressionLimits {
        self.limits
    }

    /// Parse a request body. An empty body or `null` means no filter.
    pub fn parse_bytes(&self, body: &[u8]) -> Result<Option<FilterExpression>, FilterError> {
        if body.len() > self.limits.max_body_bytes {
            return Err(FilterError::bad_input(format!(
                "filter body exceeds maximum size of {} bytes",
                self.limits.max_body_bytes
            )));
        }
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| FilterError::bad_input(format!("invalid filter JSON: {e}")))?;
        self.parse_value(&value)
    }

    pub fn parse_str(&self, body: &str) -> Result<Option<FilterExpression>, FilterError> {
        self.parse_bytes(body.as_bytes())
    }

    /// Parse an already-decoded JSON value
    pub fn parse_value(&self, value: &Value) -> Result<Option<FilterExpression>, FilterError> {
        if value.is_null() {
            return Ok(None);
        }
        let expression = self.parse_expression(value, 1)?;
        let leaves = expression.leaf_count();
        if leaves > self.limits.max_conditions {
            return Err(FilterError::bad_input(format!(
                "too many filter conditions: {leaves} (maximum {})",
                self.limits.max_conditions
            )));
        }
        tracing::debug!(leaves, "Parsed filter expression");
        Ok(Some(expression))
    }

    fn parse_expression(&self, value: &Value, depth: usize) -> Result<FilterExpression, FilterError> {
        if depth > self.limits.max_depth {
            return Err(FilterError::bad_input(format!(
                "filter expression nested deeper than {} levels",
                self.limits.max_depth
            )));
        }
        if !value.is_object() {
            return Err(FilterError::bad_input(
                "filter expression must be a JSON object",
            ));
        }
        let raw = RawExpression::deserialize(value)
            .map_err(|e| FilterError::bad_input(format!("invalid filter expression: {e}")))?;

        let operator = raw
            .operator
            .map(|op| {
                op.parse::<Operator>().map_err(|_| {
                    FilterError::bad_input(format!("unsupported operator {op:?}"))
                })
            })
            .transpose()?;

        let conditions = raw
            .conditions
            .unwrap_or_default()
            .iter()
            .map(parse_leaf)
            .collect::<Result<Vec<_>, _>>()?;

        let filters = raw
            .filters
            .unwrap_or_default()
            .iter()
            .filter(|child| !child.is_null())
            .map(|child| self.parse_expression(child, depth + 1))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FilterExpression {
            operator,
            conditions,
            filters,
        })
    }
}

fn parse_leaf(value: &Value) -> Result<FilterItem, FilterError> {
    let leaf = RawLeaf::deserialize(value)
        .map_err(|e| FilterError::bad_input(format!("invalid filter condition: {e}")))?;
    let key = leaf.property_key;
    if key.is_empty() {
        return Err(FilterError::bad_input(
            "invalid filter condition: empty property_key",
        ));
    }

    let condition = leaf.condition.parse::<Condition>().map_err(|_| {
        FilterError::bad_input(format!(
            "unsupported condition {:?} for property {key:?}",
            leaf.condition
        ))
    })?;

    let mut tagged = None;
    for (field, field_value) in &leaf.fields {
        let format = field.parse::<PropertyFormat>().map_err(|_| {
            FilterError::bad_input(format!(
                "unknown field {field:?} in condition for property {key:?}"
            ))
        })?;
        if field_value.is_null() {
            continue;
        }
        if tagged.is_some() {
            return Err(FilterError::bad_input(format!(
                "condition for property {key:?} has more than one value field"
            )));
        }
        tagged = Some(typed_value(&key, format, field_value)?);
    }

    let value = match tagged {
        Some(typed) => ItemValue::Typed(typed),
        None if condition.is_nil_valued() => ItemValue::None,
        None => {
            return Err(FilterError::bad_input(format!(
                "condition {condition} for property {key:?} requires a value field"
            )));
        }
    };

    Ok(FilterItem::new(key, condition, value))
}

fn typed_value(key: &str, format: PropertyFormat, value: &Value) -> Result<TypedValue, FilterError> {
    let mismatch = |expected: &str| {
        FilterError::bad_input(format!(
            "field {:?} of property {key:?} must be {expected}",
            format.as_str()
        ))
    };
    let string = || value.as_str().map(str::to_string).ok_or_else(|| mismatch("a string"));

    Ok(match format {
        PropertyFormat::Text => TypedValue::Text(string()?),
        PropertyFormat::Url => TypedValue::Url(string()?),
        PropertyFormat::Email => TypedValue::Email(string()?),
        PropertyFormat::Phone => TypedValue::Phone(string()?),
        PropertyFormat::Date => TypedValue::Date(string()?),
        PropertyFormat::Number => {
            TypedValue::Number(value.as_f64().ok_or_else(|| mismatch("a number"))?)
        }
        PropertyFormat::Checkbox => {
            TypedValue::Checkbox(value.as_bool().ok_or_else(|| mismatch("a boolean"))?)
        }
        PropertyFormat::MultiSelect => TypedValue::MultiSelect(
            string_list(value).ok_or_else(|| mismatch("an array of strings"))?,
        ),
        PropertyFormat::Select | PropertyFormat::Files | PropertyFormat::Objects => {
            let ids = match value {
                Value::String(id) => Identifiers::One(id.clone()),
                _ => Identifiers::Many(
                    string_list(value)
                        .ok_or_else(|| mismatch("a string or an array of strings"))?,
                ),
            };
            match format {
                PropertyFormat::Select => TypedValue::Select(ids),
                PropertyFormat::Files => TypedValue::Files(ids),
                _ => TypedValue::Objects(ids),
            }
        }
    })
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::ErrorKind;
    use serde_json::json;

    fn parser() -> ExpressionParser {
        ExpressionParser::new(ExpressionLimits {
            max_body_bytes: 64 * 1024,
            max_depth: 16,
            max_conditions: 100,
        })
    }

    fn parse(value: Value) -> Result<Option<FilterExpression>, FilterError> {
        parser().parse_value(&value)
    }

    fn bad_input(value: Value) -> String {
        let err = parse(value).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadInput, "{err}");
        err.to_string()
    }

    #[test]
    fn parses_flat_and_expression() {
        let expr = parse(json!({
            "operator": "and",
            "conditions": [
                {"property_key": "is_archived", "condition": "ne", "checkbox": true},
                {"property_key": "priority", "condition": "gte", "number": 7}
            ]
        }))
        .unwrap()
        .unwrap();
        assert_eq!(expr.operator, Some(Operator::And));
        assert_eq!(
            expr.conditions,
            vec![
                FilterItem::new(
                    "is_archived",
                    Condition::Ne,
                    ItemValue::Typed(TypedValue::Checkbox(true))
                ),
                FilterItem::new(
                    "priority",
                    Condition::Gte,
                    ItemValue::Typed(TypedValue::Number(7.0))
                ),
            ]
        );
        assert!(expr.filters.is_empty());
    }

    #[test]
    fn parses_nested_filters() {
        let expr = parse(json!({
            "operator": "and",
            "filters": [{
                "operator": "or",
                "conditions": [
                    {"property_key": "priority", "condition": "gt", "number": 5},
                    {"property_key": "tags", "condition": "in", "multi_select": ["urgent", "critical"]}
                ]
            }]
        }))
        .unwrap()
        .unwrap();
        assert_eq!(expr.filters.len(), 1);
        let inner = &expr.filters[0];
        assert_eq!(inner.operator, Some(Operator::Or));
        assert_eq!(
            inner.conditions[1].value,
            ItemValue::Typed(TypedValue::MultiSelect(vec![
                "urgent".into(),
                "critical".into()
            ]))
        );
    }

    #[test]
    fn operator_is_optional() {
        let expr = parse(json!({
            "conditions": [{"property_key": "name", "condition": "eq", "text": "x"}]
        }))
        .unwrap()
        .unwrap();
        assert_eq!(expr.operator, None);
    }

    #[test]
    fn null_and_empty_bodies_are_no_filter() {
        assert_eq!(parse(Value::Null).unwrap(), None);
        assert_eq!(parser().parse_str("").unwrap(), None);
        assert_eq!(parser().parse_str("  null ").unwrap(), None);
        let expr = parse(json!({})).unwrap().unwrap();
        assert!(expr.is_empty());
    }

    #[test]
    fn empty_conditions_need_no_format() {
        let expr = parse(json!({
            "conditions": [
                {"property_key": "description", "condition": "empty"},
                {"property_key": "tags", "condition": "nempty", "multi_select": null}
            ]
        }))
        .unwrap()
        .unwrap();
        assert_eq!(expr.conditions[0].value, ItemValue::None);
        assert_eq!(expr.conditions[1].value, ItemValue::None);
    }

    #[test]
    fn empty_condition_may_carry_a_format() {
        let expr = parse(json!({
            "conditions": [{"property_key": "title", "condition": "empty", "text": ""}]
        }))
        .unwrap()
        .unwrap();
        assert_eq!(
            expr.conditions[0].value,
            ItemValue::Typed(TypedValue::Text(String::new()))
        );
    }

    #[test]
    fn select_accepts_one_or_many() {
        let expr = parse(json!({
            "conditions": [
                {"property_key": "status", "condition": "in", "select": "open"},
                {"property_key": "status", "condition": "in", "select": ["open", "closed"]},
                {"property_key": "links", "condition": "all", "objects": ["o1"]},
                {"property_key": "attachments", "condition": "nin", "files": "f1"}
            ]
        }))
        .unwrap()
        .unwrap();
        assert_eq!(
            expr.conditions[0].value,
            ItemValue::Typed(TypedValue::Select(Identifiers::One("open".into())))
        );
        assert_eq!(
            expr.conditions[1].value,
            ItemValue::Typed(TypedValue::Select(Identifiers::Many(vec![
                "open".into(),
                "closed".into()
            ])))
        );
        assert_eq!(
            expr.conditions[2].value.tagged_format(),
            Some(PropertyFormat::Objects)
        );
        assert_eq!(
            expr.conditions[3].value.tagged_format(),
            Some(PropertyFormat::Files)
        );
    }

    #[test]
    fn missing_value_field_is_bad_input() {
        let message = bad_input(json!({
            "conditions": [{"property_key": "priority", "condition": "gt"}]
        }));
        assert!(message.contains("priority"));
    }

    #[test]
    fn two_value_fields_are_bad_input() {
        let message = bad_input(json!({
            "conditions": [{"property_key": "priority", "condition": "eq", "number": 1, "text": "1"}]
        }));
        assert!(message.contains("more than one value field"));
    }

    #[test]
    fn unknown_field_is_bad_input() {
        let message = bad_input(json!({
            "conditions": [{"property_key": "priority", "condition": "eq", "longtext": "x"}]
        }));
        assert!(message.contains("longtext"));
    }

    #[test]
    fn unknown_condition_is_bad_input() {
        let message = bad_input(json!({
            "conditions": [{"property_key": "priority", "condition": "exists", "number": 1}]
        }));
        assert!(message.contains("exists"));
        assert!(message.contains("priority"));
    }

    #[test]
    fn unknown_operator_is_bad_input() {
        let message = bad_input(json!({"operator": "xor", "conditions": []}));
        assert!(message.contains("xor"));
    }

    #[test]
    fn wrong_value_type_is_bad_input() {
        let message = bad_input(json!({
            "conditions": [{"property_key": "priority", "condition": "eq", "number": "seven"}]
        }));
        assert!(message.contains("number"));
        bad_input(json!({
            "conditions": [{"property_key": "tags", "condition": "in", "multi_select": "urgent"}]
        }));
        bad_input(json!({
            "conditions": [{"property_key": "done", "condition": "eq", "checkbox": "true"}]
        }));
    }

    #[test]
    fn missing_property_key_is_bad_input() {
        bad_input(json!({"conditions": [{"condition": "eq", "text": "x"}]}));
        bad_input(json!({"conditions": [{"property_key": "", "condition": "eq", "text": "x"}]}));
    }

    #[test]
    fn non_object_expression_is_bad_input() {
        bad_input(json!([1, 2]));
        bad_input(json!({"filters": [42]}));
        bad_input(json!({"conditions": "name"}));
    }

    #[test]
    fn invalid_json_is_bad_input() {
        let err = parser().parse_str("{not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadInput);
    }

    #[test]
    fn body_size_is_bounded() {
        let parser = ExpressionParser::new(ExpressionLimits {
            max_body_bytes: 16,
            ..parser().limits()
        });
        let err = parser
            .parse_str(r#"{"conditions": [], "filters": []}"#)
            .unwrap_err();
        assert!(err.to_string().contains("16 bytes"));
    }

    #[test]
    fn depth_is_bounded() {
        let parser = ExpressionParser::new(ExpressionLimits {
            max_depth: 3,
            ..parser().limits()
        });
        let leaf = json!({"property_key": "a", "condition": "empty"});
        let depth3 = json!({"filters": [{"filters": [{"conditions": [leaf.clone()]}]}]});
        assert!(parser.parse_value(&depth3).is_ok());
        let depth4 = json!({"filters": [depth3]});
        let err = parser.parse_value(&depth4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadInput);
    }

    #[test]
    fn condition_count_is_bounded() {
        let parser = ExpressionParser::new(ExpressionLimits {
            max_conditions: 2,
            ..parser().limits()
        });
        let leaf = json!({"property_key": "a", "condition": "empty"});
        let ok = json!({"conditions": [leaf.clone()], "filters": [{"conditions": [leaf.clone()]}]});
        assert!(parser.parse_value(&ok).is_ok());
        let too_many = json!({"conditions": [leaf.clone(), leaf.clone()], "filters": [{"conditions": [leaf]}]});
        assert!(parser.parse_value(&too_many).is_err());
    }
}
