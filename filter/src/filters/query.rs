//! URL query filter parsing
//!
//! Turns `name=value` and `name[cond]=value` parameters into a flat list of
//! [`FilterItem`]s. The parser knows nothing about property formats; values
//! stay strings (or string lists) until validation.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::core::config::FilterConfig;
use crate::core::constants::RESERVED_QUERY_KEYS;
use crate::utils::string::{decode_form_component, is_truthy, split_list};

use super::error::FilterError;
use super::types::{Condition, FilterItem, ItemValue, QueryValue};

fn key_pattern() -> &'static Regex {
    static KEY_PATTERN: OnceLock<Regex> = OnceLock::new();
    KEY_PATTERN.get_or_init(|| Regex::new(r"^(.+)\[(\w+)\]$").expect("Invalid regex"))
}

/// Split a raw query string into decoded key/value pairs, in order.
///
/// A leading `?` is ignored, as are empty segments. A segment without `=`
/// has an empty value.
pub fn query_pairs(raw_query: &str) -> Result<Vec<(String, String)>, FilterError> {
    let raw_query = raw_query.strip_prefix('?').unwrap_or(raw_query);
    raw_query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (raw_key, raw_value) = segment.split_once('=').unwrap_or((segment, ""));
            let key = decode_form_component(raw_key).map_err(|e| {
                FilterError::bad_input(format!("invalid query key {raw_key:?}: {e}"))
            })?;
            let value = decode_form_component(raw_value).map_err(|e| {
                FilterError::bad_input(format!("invalid value for query key {key:?}: {e}"))
            })?;
            Ok((key, value))
        })
        .collect()
}

/// Default conditions of bare `name=value` keys, per property
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryDefaults {
    conditions: HashMap<String, Condition>,
}

impl QueryDefaults {
    pub fn with(mut self, property: impl Into<String>, condition: Condition) -> Self {
        self.conditions.insert(property.into(), condition);
        self
    }

    pub fn condition_for(&self, property: &str) -> Condition {
        self.conditions
            .get(property)
            .copied()
            .unwrap_or(Condition::Eq)
    }
}

/// Parser for the URL query dialect
#[derive(Debug, Clone)]
pub struct QueryParser {
    max_conditions: usize,
    endpoints: HashMap<String, QueryDefaults>,
}

impl Default for QueryParser {
    fn default() -> Self {
        Self::from_config(&FilterConfig::default())
    }
}

impl QueryParser {
    pub fn new(max_conditions: usize) -> Self {
        Self {
            max_conditions,
            endpoints: HashMap::new(),
        }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        let mut parser = Self::new(config.limits.max_conditions);
        for (endpoint, endpoint_config) in &config.endpoints {
            let defaults = endpoint_config
                .defaults
                .iter()
                .fold(QueryDefaults::default(), |defaults, (property, condition)| {
                    defaults.with(property.clone(), *condition)
                });
            parser = parser.with_endpoint(endpoint.clone(), defaults);
        }
        parser
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>, defaults: QueryDefaults) -> Self {
        self.endpoints.insert(endpoint.into(), defaults);
        self
    }

    fn default_condition(&self, endpoint: Option<&str>, property: &str) -> Condition {
        endpoint
            .and_then(|name| self.endpoints.get(name))
            .map(|defaults| defaults.condition_for(property))
            .unwrap_or(Condition::Eq)
    }

    /// Parse a raw query string into filter items, in query order.
    ///
    /// Reserved pagination and sort keys are skipped. The first bad key or
    /// value aborts the whole parse.
    pub fn parse(
        &self,
        raw_query: &str,
        endpoint: Option<&str>,
    ) -> Result<Vec<FilterItem>, FilterError> {
        let mut items = Vec::new();
        for (key, value) in query_pairs(raw_query)? {
            if RESERVED_QUERY_KEYS.contains(&key.as_str()) {
                continue;
            }
            let item = self.parse_param(&key, value, endpoint)?;
            items.push(item);
            if items.len() > self.max_conditions {
                return Err(FilterError::bad_input(format!(
                    "too many filters: maximum {} allowed",
                    self.max_conditions
                )));
            }
        }
        tracing::debug!(endpoint, filters = items.len(), "Parsed query filters");
        Ok(items)
    }

    fn parse_param(
        &self,
        key: &str,
        value: String,
        endpoint: Option<&str>,
    ) -> Result<FilterItem, FilterError> {
        if key.is_empty() {
            return Err(FilterError::bad_input("invalid filter key: empty property name"));
        }

        let (property, condition) = match key_pattern().captures(key) {
            Some(caps) => {
                let property = &caps[1];
                let token = caps[2].to_lowercase();
                let condition = token.parse::<Condition>().map_err(|_| {
                    tracing::warn!(key, condition = %token, "Rejected filter condition");
                    FilterError::bad_input(format!(
                        "invalid filter key {key:?}: unsupported condition {token:?}"
                    ))
                })?;
                (property.to_string(), condition)
            }
            None => (key.to_string(), self.default_condition(endpoint, key)),
        };

        let value = if condition.is_set() {
            QueryValue::List(split_list(&value))
        } else if condition.is_nil_valued() {
            QueryValue::Flag(is_truthy(&value))
        } else {
            QueryValue::Text(value)
        };

        Ok(FilterItem::new(property, condition, ItemValue::Query(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::ErrorKind;

    fn parse(query: &str) -> Result<Vec<FilterItem>, FilterError> {
        QueryParser::new(100).parse(query, None)
    }

    fn text(property: &str, condition: Condition, value: &str) -> FilterItem {
        FilterItem::new(
            property,
            condition,
            ItemValue::Query(QueryValue::Text(value.into())),
        )
    }

    fn list(property: &str, condition: Condition, values: &[&str]) -> FilterItem {
        FilterItem::new(
            property,
            condition,
            ItemValue::Query(QueryValue::List(
                values.iter().map(|v| v.to_string()).collect(),
            )),
        )
    }

    #[test]
    fn bare_keys_default_to_eq() {
        let items = parse("name=test&status=active").unwrap();
        assert_eq!(
            items,
            vec![
                text("name", Condition::Eq, "test"),
                text("status", Condition::Eq, "active"),
            ]
        );
    }

    #[test]
    fn endpoint_defaults_override_bare_keys() {
        let parser = QueryParser::new(100).with_endpoint(
            "spaces",
            QueryDefaults::default().with("name", Condition::Contains),
        );
        let items = parser.parse("name=test&status=active", Some("spaces")).unwrap();
        assert_eq!(items[0].condition, Condition::Contains);
        assert_eq!(items[1].condition, Condition::Eq);

        let items = parser.parse("name=test", Some("objects")).unwrap();
        assert_eq!(items[0].condition, Condition::Eq);

        let items = parser.parse("name[eq]=test", Some("spaces")).unwrap();
        assert_eq!(items[0].condition, Condition::Eq);
    }

    #[test]
    fn bracketed_conditions() {
        let items = parse("age[gt]=25&name[contains]=john&tags[in]=todo,done").unwrap();
        assert_eq!(
            items,
            vec![
                text("age", Condition::Gt, "25"),
                text("name", Condition::Contains, "john"),
                list("tags", Condition::In, &["todo", "done"]),
            ]
        );
    }

    #[test]
    fn set_values_are_trimmed() {
        let items = parse("tags[nin]=a,%20b%20,c&tags[all]=").unwrap();
        assert_eq!(items[0], list("tags", Condition::Nin, &["a", "b", "c"]));
        assert_eq!(items[1], list("tags", Condition::All, &[]));
    }

    #[test]
    fn other_conditions_keep_commas() {
        let items = parse("title[contains]=a,b").unwrap();
        assert_eq!(items[0], text("title", Condition::Contains, "a,b"));
    }

    #[test]
    fn empty_flags() {
        let items = parse(
            "description[empty]=true&tags[nempty]=1&a[empty]=&b[empty]=TRUE&c[nempty]=false&d[empty]=yes",
        )
        .unwrap();
        let flags: Vec<_> = items
            .iter()
            .map(|item| match &item.value {
                ItemValue::Query(QueryValue::Flag(flag)) => *flag,
                other => panic!("expected flag, got {other:?}"),
            })
            .collect();
        assert_eq!(flags, vec![true, true, true, true, false, false]);
        assert_eq!(items[0].condition, Condition::Empty);
        assert_eq!(items[1].condition, Condition::NEmpty);
    }

    #[test]
    fn condition_tokens_are_case_insensitive() {
        let items = parse("name[EQ]=test&age[Gte]=3").unwrap();
        assert_eq!(items[0].condition, Condition::Eq);
        assert_eq!(items[1].condition, Condition::Gte);
    }

    #[test]
    fn unknown_condition_is_bad_input() {
        let err = parse("name[invalid]=test").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadInput);
        assert!(err.to_string().contains("invalid"));
        assert!(err.to_string().contains("name[invalid]"));
    }

    #[test]
    fn internal_only_conditions_are_rejected() {
        for query in ["name[exists]=1", "tags[exactin]=a", "tags[nallin]=a"] {
            let err = parse(query).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::BadInput, "{query}");
        }
    }

    #[test]
    fn reserved_keys_are_skipped() {
        let items = parse("offset=10&limit=20&sort=name&order=asc&name=test").unwrap();
        assert_eq!(items, vec![text("name", Condition::Eq, "test")]);
    }

    #[test]
    fn empty_property_name_is_bad_input() {
        let err = parse("=value").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadInput);
    }

    #[test]
    fn odd_keys_are_literal_properties() {
        let items = parse("[eq]=x&name[eq=y").unwrap();
        assert_eq!(items[0], text("[eq]", Condition::Eq, "x"));
        assert_eq!(items[1], text("name[eq", Condition::Eq, "y"));
    }

    #[test]
    fn keys_and_values_are_decoded_once() {
        let items = parse("my%20prop%5Bcontains%5D=hello+world&x=%2541").unwrap();
        assert_eq!(items[0], text("my prop", Condition::Contains, "hello world"));
        assert_eq!(items[1], text("x", Condition::Eq, "%41"));
    }

    #[test]
    fn undecodable_value_is_bad_input() {
        let err = parse("name=%zz").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadInput);
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn duplicate_keys_produce_one_filter_each() {
        let items = parse("age[gt]=1&age[gt]=2").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1], text("age", Condition::Gt, "2"));
    }

    #[test]
    fn empty_query_yields_no_filters() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("?").unwrap().is_empty());
        assert!(parse("offset=0&&limit=10").unwrap().is_empty());
    }

    #[test]
    fn filter_count_is_bounded() {
        let parser = QueryParser::new(2);
        assert!(parser.parse("a=1&b=2", None).is_ok());
        let err = parser.parse("a=1&b=2&c=3", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadInput);
    }

    #[test]
    fn default_parser_uses_builtin_endpoint_defaults() {
        let items = QueryParser::default().parse("name=test", Some("spaces")).unwrap();
        assert_eq!(items[0].condition, Condition::Contains);
    }
}
