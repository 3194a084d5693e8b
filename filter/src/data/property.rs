//! Property model
//!
//! Read-only view of the property definitions of a space. Properties are
//! addressed by users through their API `key` and by the object store through
//! their `relation_key`; a [`PropertySnapshot`] answers both lookups.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Value domain of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyFormat {
    Text,
    Url,
    Email,
    Phone,
    Number,
    Date,
    Checkbox,
    Select,
    MultiSelect,
    Files,
    Objects,
}

/// Groups of formats that share a value representation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFamily {
    Text,
    Number,
    Date,
    Checkbox,
    Identifiers,
}

impl PropertyFormat {
    pub const ALL: [PropertyFormat; 11] = [
        Self::Text,
        Self::Url,
        Self::Email,
        Self::Phone,
        Self::Number,
        Self::Date,
        Self::Checkbox,
        Self::Select,
        Self::MultiSelect,
        Self::Files,
        Self::Objects,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Url => "url",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Number => "number",
            Self::Date => "date",
            Self::Checkbox => "checkbox",
            Self::Select => "select",
            Self::MultiSelect => "multi_select",
            Self::Files => "files",
            Self::Objects => "objects",
        }
    }

    pub fn family(&self) -> ValueFamily {
        match self {
            Self::Text | Self::Url | Self::Email | Self::Phone => ValueFamily::Text,
            Self::Number => ValueFamily::Number,
            Self::Date => ValueFamily::Date,
            Self::Checkbox => ValueFamily::Checkbox,
            Self::Select | Self::MultiSelect | Self::Files | Self::Objects => {
                ValueFamily::Identifiers
            }
        }
    }

    /// Formats whose values may legitimately be lists outside set conditions
    pub fn is_list_shaped(&self) -> bool {
        self.family() == ValueFamily::Identifiers
    }
}

impl fmt::Display for PropertyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| format!("invalid property format: {:?}", s))
    }
}

/// Property definition as exposed by the property service
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Property {
    #[serde(default)]
    pub id: String,
    /// User-visible identifier
    pub key: String,
    /// Identifier used by the object store
    pub relation_key: String,
    #[serde(default)]
    pub name: String,
    pub format: PropertyFormat,
}

impl Property {
    pub fn new(
        key: impl Into<String>,
        relation_key: impl Into<String>,
        format: PropertyFormat,
    ) -> Self {
        let key = key.into();
        Self {
            id: String::new(),
            name: key.clone(),
            key,
            relation_key: relation_key.into(),
            format,
        }
    }
}

/// Immutable per-request view of a space's properties
#[derive(Debug, Clone, Default)]
pub struct PropertySnapshot {
    properties: Vec<Property>,
    by_key: HashMap<String, usize>,
    by_relation_key: HashMap<String, usize>,
}

impl PropertySnapshot {
    pub fn new(properties: impl IntoIterator<Item = Property>) -> Self {
        let properties: Vec<Property> = properties.into_iter().collect();
        let mut by_key = HashMap::with_capacity(properties.len());
        let mut by_relation_key = HashMap::with_capacity(properties.len());
        for (idx, property) in properties.iter().enumerate() {
            by_key.entry(property.key.clone()).or_insert(idx);
            by_relation_key
                .entry(property.relation_key.clone())
                .or_insert(idx);
        }
        Self {
            properties,
            by_key,
            by_relation_key,
        }
    }

    /// Look up a property by its user-visible key or its relation key.
    ///
    /// The user key wins when both spaces contain the identifier.
    pub fn resolve(&self, user_or_internal: &str) -> Option<&Property> {
        self.by_key
            .get(user_or_internal)
            .or_else(|| self.by_relation_key.get(user_or_internal))
            .map(|&idx| &self.properties[idx])
    }

    pub fn resolve_relation_key(&self, user_or_internal: &str) -> Option<&str> {
        self.resolve(user_or_internal)
            .map(|property| property.relation_key.as_str())
    }

    pub fn get_by_relation_key(&self, relation_key: &str) -> Option<&Property> {
        self.by_relation_key
            .get(relation_key)
            .map(|&idx| &self.properties[idx])
    }

    pub fn contains_relation_key(&self, relation_key: &str) -> bool {
        self.by_relation_key.contains_key(relation_key)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> PropertySnapshot {
        PropertySnapshot::new([
            Property::new("title", "title", PropertyFormat::Text),
            Property::new("my_custom_property", "custom_prop", PropertyFormat::Text),
            Property::new("tags", "tag", PropertyFormat::MultiSelect),
        ])
    }

    #[test]
    fn resolve_by_user_key() {
        let snapshot = snapshot();
        let property = snapshot.resolve("my_custom_property").unwrap();
        assert_eq!(property.relation_key, "custom_prop");
    }

    #[test]
    fn resolve_by_relation_key() {
        let snapshot = snapshot();
        assert_eq!(snapshot.resolve_relation_key("custom_prop"), Some("custom_prop"));
        assert_eq!(snapshot.resolve_relation_key("tag"), Some("tag"));
    }

    #[test]
    fn get_by_relation_key_ignores_user_keys() {
        let snapshot = snapshot();
        assert_eq!(
            snapshot.get_by_relation_key("custom_prop").map(|p| p.key.as_str()),
            Some("my_custom_property")
        );
        assert!(snapshot.get_by_relation_key("my_custom_property").is_none());
        assert!(snapshot.contains_relation_key("tag"));
    }

    #[test]
    fn resolve_unknown_is_none() {
        let snapshot = snapshot();
        assert!(snapshot.resolve("unknown_property").is_none());
        assert!(snapshot.resolve("").is_none());
    }

    #[test]
    fn user_key_takes_precedence() {
        let snapshot = PropertySnapshot::new([
            Property::new("status", "rel_a", PropertyFormat::Select),
            Property::new("other", "status", PropertyFormat::Text),
        ]);
        assert_eq!(snapshot.resolve_relation_key("status"), Some("rel_a"));
    }

    #[test]
    fn format_round_trips_through_str() {
        for format in PropertyFormat::ALL {
            assert_eq!(format.as_str().parse::<PropertyFormat>(), Ok(format));
        }
        assert!("longtext".parse::<PropertyFormat>().is_err());
    }

    #[test]
    fn format_serde_uses_snake_case() {
        let json = serde_json::to_string(&PropertyFormat::MultiSelect).unwrap();
        assert_eq!(json, "\"multi_select\"");
        let parsed: PropertyFormat = serde_json::from_str("\"checkbox\"").unwrap();
        assert_eq!(parsed, PropertyFormat::Checkbox);
    }

    #[test]
    fn list_shaped_formats() {
        assert!(PropertyFormat::MultiSelect.is_list_shaped());
        assert!(PropertyFormat::Objects.is_list_shaped());
        assert!(!PropertyFormat::Date.is_list_shaped());
        assert!(!PropertyFormat::Text.is_list_shaped());
    }
}
