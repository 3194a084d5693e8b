//! Sort option vocabulary
//!
//! Only parsing lives here: the `sort` and `order` query keys, or a JSON
//! `{"property_key", "direction"}` object, become a [`SortOptions`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::FilterError;
use super::query::query_pairs;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortProperty {
    CreatedDate,
    #[default]
    LastModifiedDate,
    LastOpenedDate,
    Name,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortProperty {
    pub const ALL: [SortProperty; 4] = [
        Self::CreatedDate,
        Self::LastModifiedDate,
        Self::LastOpenedDate,
        Self::Name,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedDate => "created_date",
            Self::LastModifiedDate => "last_modified_date",
            Self::LastOpenedDate => "last_opened_date",
            Self::Name => "name",
        }
    }
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortProperty {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|property| property.as_str() == s)
            .ok_or_else(|| FilterError::bad_input(format!("unsupported sort property {s:?}")))
    }
}

impl FromStr for SortDirection {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(FilterError::bad_input(format!(
                "unsupported sort direction {s:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SortOptions {
    #[serde(default)]
    pub property_key: SortProperty,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortOptions {
    /// Read `sort` and `order` from a raw query string; later keys win
    pub fn from_query(raw_query: &str) -> Result<Self, FilterError> {
        let mut options = Self::default();
        for (key, value) in query_pairs(raw_query)? {
            match key.as_str() {
                "sort" => options.property_key = value.parse()?,
                "order" => options.direction = value.parse()?,
                _ => {}
            }
        }
        Ok(options)
    }
}
