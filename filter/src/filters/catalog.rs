//! Condition catalog
//!
//! Static tables mapping public condition tokens to object-store conditions
//! and listing the conditions each property format accepts. The forward and
//! reverse maps are kept in lockstep and checked against each other in tests.

use crate::data::PropertyFormat;

use super::types::{Condition, InternalCondition};

/// Public token ↔ internal condition; must agree with [`internal`]
const CONDITION_MAP: [(Condition, InternalCondition); 13] = [
    (Condition::Eq, InternalCondition::Equal),
    (Condition::Ne, InternalCondition::NotEqual),
    (Condition::Gt, InternalCondition::Greater),
    (Condition::Gte, InternalCondition::GreaterOrEqual),
    (Condition::Lt, InternalCondition::Less),
    (Condition::Lte, InternalCondition::LessOrEqual),
    (Condition::Contains, InternalCondition::Like),
    (Condition::NContains, InternalCondition::NotLike),
    (Condition::In, InternalCondition::In),
    (Condition::Nin, InternalCondition::NotIn),
    (Condition::All, InternalCondition::AllIn),
    (Condition::Empty, InternalCondition::Empty),
    (Condition::NEmpty, InternalCondition::NotEmpty),
];

const TEXT_CONDITIONS: &[InternalCondition] = &[
    InternalCondition::Equal,
    InternalCondition::NotEqual,
    InternalCondition::Like,
    InternalCondition::NotLike,
    InternalCondition::Empty,
    InternalCondition::NotEmpty,
];

const NUMBER_CONDITIONS: &[InternalCondition] = &[
    InternalCondition::Equal,
    InternalCondition::NotEqual,
    InternalCondition::Greater,
    InternalCondition::GreaterOrEqual,
    InternalCondition::Less,
    InternalCondition::LessOrEqual,
    InternalCondition::Empty,
    InternalCondition::NotEmpty,
];

const DATE_CONDITIONS: &[InternalCondition] = &[
    InternalCondition::Equal,
    InternalCondition::Greater,
    InternalCondition::GreaterOrEqual,
    InternalCondition::Less,
    InternalCondition::LessOrEqual,
    InternalCondition::In,
    InternalCondition::Empty,
    InternalCondition::NotEmpty,
];

const CHECKBOX_CONDITIONS: &[InternalCondition] =
    &[InternalCondition::Equal, InternalCondition::NotEqual];

const IDENTIFIER_CONDITIONS: &[InternalCondition] = &[
    InternalCondition::In,
    InternalCondition::NotIn,
    InternalCondition::AllIn,
    InternalCondition::Empty,
    InternalCondition::NotEmpty,
];

/// Map a public token to its internal condition.
///
/// Tokens are matched exactly; callers lowercase query input first.
pub fn to_internal(token: &str) -> Option<InternalCondition> {
    token.parse::<Condition>().ok().map(internal)
}

/// Internal condition of a public condition
pub fn internal(condition: Condition) -> InternalCondition {
    match condition {
        Condition::Eq => InternalCondition::Equal,
        Condition::Ne => InternalCondition::NotEqual,
        Condition::Gt => InternalCondition::Greater,
        Condition::Gte => InternalCondition::GreaterOrEqual,
        Condition::Lt => InternalCondition::Less,
        Condition::Lte => InternalCondition::LessOrEqual,
        Condition::Contains => InternalCondition::Like,
        Condition::NContains => InternalCondition::NotLike,
        Condition::In => InternalCondition::In,
        Condition::Nin => InternalCondition::NotIn,
        Condition::All => InternalCondition::AllIn,
        Condition::Empty => InternalCondition::Empty,
        Condition::NEmpty => InternalCondition::NotEmpty,
    }
}

/// Map an internal condition back to its public token.
///
/// Internal-only conditions (`Exists`, `NotAllIn`, `ExactIn`, `NotExactIn`)
/// have no token and yield `None`.
pub fn from_internal(condition: InternalCondition) -> Option<&'static str> {
    CONDITION_MAP
        .iter()
        .find(|(_, internal)| *internal == condition)
        .map(|(public, _)| public.as_str())
}

/// Conditions a property format accepts
pub fn conditions_for(format: PropertyFormat) -> &'static [InternalCondition] {
    match format {
        PropertyFormat::Text | PropertyFormat::Url | PropertyFormat::Email | PropertyFormat::Phone => {
            TEXT_CONDITIONS
        }
        PropertyFormat::Number => NUMBER_CONDITIONS,
        PropertyFormat::Date => DATE_CONDITIONS,
        PropertyFormat::Checkbox => CHECKBOX_CONDITIONS,
        PropertyFormat::Select
        | PropertyFormat::MultiSelect
        | PropertyFormat::Files
        | PropertyFormat::Objects => IDENTIFIER_CONDITIONS,
    }
}

pub fn is_allowed(format: PropertyFormat, condition: InternalCondition) -> bool {
    conditions_for(format).contains(&condition)
}

/// Public conditions legal for a format, in vocabulary order
pub fn public_conditions_for(format: PropertyFormat) -> Vec<Condition> {
    CONDITION_MAP
        .iter()
        .filter(|(_, internal)| is_allowed(format, *internal))
        .map(|(public, _)| *public)
        .collect()
}
