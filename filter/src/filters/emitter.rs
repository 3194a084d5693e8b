//! Filter tree emission
//!
//! Folds validated filters into backend [`FilterNode`]s. Emission cannot fail.

use super::types::{FilterNode, Operator};
use super::validator::{ValidatedExpression, ValidatedItem};

pub fn emit_item(item: ValidatedItem) -> FilterNode {
    FilterNode::Leaf {
        relation_key: item.relation_key,
        condition: item.condition,
        value: item.value,
    }
}

/// Emit query filters as a flat list of leaves; the caller decides how to
/// join them.
pub fn emit_items(items: Vec<ValidatedItem>) -> Vec<FilterNode> {
    items.into_iter().map(emit_item).collect()
}

/// Emit an expression tree, collapsing groups bottom-up.
///
/// A group without children disappears. A single child replaces its group
/// unless the group was authored with an explicit operator.
pub fn emit_expression(expression: ValidatedExpression) -> Option<FilterNode> {
    let mut nested: Vec<FilterNode> = expression.items.into_iter().map(emit_item).collect();
    nested.extend(expression.children.into_iter().filter_map(emit_expression));

    match (nested.len(), expression.operator) {
        (0, _) => None,
        (1, None) => nested.pop(),
        (_, operator) => Some(FilterNode::Group {
            operator: operator.unwrap_or_default(),
            nested,
        }),
    }
}

/// Join several lists of emitted nodes under one operator.
///
/// Returns `None` when every list is empty and the node itself when only one
/// node remains.
pub fn combine<I>(operator: Operator, groups: I) -> Option<FilterNode>
where
    I: IntoIterator<Item = Vec<FilterNode>>,
{
    let mut nested: Vec<FilterNode> = groups.into_iter().flatten().collect();
    match nested.len() {
        0 => None,
        1 => nested.pop(),
        _ => Some(FilterNode::Group { operator, nested }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::types::{FilterValue, InternalCondition};

    fn item(relation_key: &str) -> ValidatedItem {
        ValidatedItem {
            relation_key: relation_key.into(),
            condition: InternalCondition::Equal,
            value: Some(FilterValue::Number(1.0)),
        }
    }

    fn leaf(relation_key: &str) -> FilterNode {
        emit_item(item(relation_key))
    }

    fn group(operator: Option<Operator>, items: &[&str], children: Vec<ValidatedExpression>) -> ValidatedExpression {
        ValidatedExpression {
            operator,
            items: items.iter().map(|key| item(key)).collect(),
            children,
        }
    }

    #[test]
    fn empty_expression_is_no_filter() {
        assert_eq!(emit_expression(ValidatedExpression::default()), None);
        assert_eq!(emit_expression(group(Some(Operator::Or), &[], vec![])), None);
    }

    #[test]
    fn single_child_without_operator_collapses() {
        assert_eq!(emit_expression(group(None, &["a"], vec![])), Some(leaf("a")));
        let nested = group(None, &[], vec![group(None, &[], vec![group(None, &["a"], vec![])])]);
        assert_eq!(emit_expression(nested), Some(leaf("a")));
    }

    #[test]
    fn single_child_with_operator_is_kept() {
        let emitted = emit_expression(group(Some(Operator::And), &["a"], vec![])).unwrap();
        assert_eq!(
            emitted,
            FilterNode::Group {
                operator: Operator::And,
                nested: vec![leaf("a")],
            }
        );
    }

    #[test]
    fn default_operator_is_and() {
        let emitted = emit_expression(group(None, &["a", "b"], vec![])).unwrap();
        assert_eq!(
            emitted,
            FilterNode::Group {
                operator: Operator::And,
                nested: vec![leaf("a"), leaf("b")],
            }
        );
    }

    #[test]
    fn empty_children_are_dropped() {
        let expression = group(
            Some(Operator::Or),
            &["a", "b"],
            vec![group(Some(Operator::And), &[], vec![])],
        );
        let emitted = emit_expression(expression).unwrap();
        assert_eq!(
            emitted,
            FilterNode::Group {
                operator: Operator::Or,
                nested: vec![leaf("a"), leaf("b")],
            }
        );
    }

    #[test]
    fn deeply_nested_explicit_groups_survive() {
        let expression = group(
            Some(Operator::And),
            &[],
            vec![group(
                Some(Operator::Or),
                &[],
                vec![group(Some(Operator::And), &["priority"], vec![])],
            )],
        );
        let emitted = emit_expression(expression).unwrap();
        assert_eq!(emitted.depth(), 4);
    }

    #[test]
    fn items_precede_children() {
        let expression = group(None, &["a"], vec![group(Some(Operator::Or), &["b", "c"], vec![])]);
        let FilterNode::Group { nested, .. } = emit_expression(expression).unwrap() else {
            panic!("expected group");
        };
        assert!(nested[0].is_leaf());
        assert!(!nested[1].is_leaf());
    }

    #[test]
    fn flat_emission() {
        let nodes = emit_items(vec![item("a"), item("b")]);
        assert_eq!(nodes, vec![leaf("a"), leaf("b")]);
        assert!(emit_items(vec![]).is_empty());
    }

    #[test]
    fn combine_groups() {
        assert_eq!(combine(Operator::And, vec![vec![], vec![]]), None);
        assert_eq!(combine(Operator::And, vec![vec![], vec![leaf("a")]]), Some(leaf("a")));
        assert_eq!(
            combine(Operator::Or, vec![vec![leaf("a")], vec![leaf("b")]]),
            Some(FilterNode::Group {
                operator: Operator::Or,
                nested: vec![leaf("a"), leaf("b")],
            })
        );
    }
}
