//! Metadata filter expressions.
//!
//! A filter is a JSON document of the form
//!
//! ```json
//! { "filters": [
//!     { "field": "status", "operator": "eq", "value": "published" },
//!     { "or": [
//!         { "field": "category", "operator": "eq", "value": "pricing" },
//!         { "field": "category", "operator": "eq", "value": "billing" }
//!     ]}
//! ]}
//! ```
//!
//! Top-level members are AND-combined. A group holds exactly one of `and` /
//! `or`, and its members must be plain conditions. Anything that is not an
//! object, or has no `filters` list, means "no filter".
//!
//! [`parse`] is the single decode step: it validates the raw JSON and builds
//! the typed [`FilterExpression`]. Value shapes are only checked on request,
//! via [`FilterExpression::check_values`].

mod canonical;
mod operator;

use serde_json::{Map, Value};
use strum::Display;

pub use canonical::{canonicalize, is_truthy, CanonicalFilter};
pub use operator::{Operator, ValueShape};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("{path}: expected a condition (field + operator) or a group (and / or)")]
    UnrecognizedMember { path: String },
    #[error("{path}: unknown operator {operator}")]
    UnknownOperator { path: String, operator: String },
    #[error("{path}: a group must have exactly one of 'and' or 'or'")]
    AmbiguousGroup { path: String },
    #[error("{path}: expected a list of conditions")]
    GroupNotList { path: String },
    #[error("{path}: group members must be conditions with a field and an operator")]
    InvalidGroupMember { path: String },
    #[error("{path}: operator '{operator}' expects {expected}")]
    InvalidValue {
        path: String,
        operator: Operator,
        expected: &'static str,
    },
}

/// Boolean combinator of a [`FilterGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Combinator {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterGroup {
    pub combinator: Combinator,
    pub members: Vec<FilterNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Condition(FilterCondition),
    Group(FilterGroup),
}

/// A validated, non-empty filter expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpression {
    pub filters: Vec<FilterNode>,
}

impl FilterExpression {
    /// Check every condition's value against its operator's expected shape.
    pub fn check_values(&self) -> Result<(), FilterError> {
        self.filters
            .iter()
            .enumerate()
            .try_for_each(|(i, node)| node.check_values(&format!("filters[{}]", i)))
    }

    /// Number of conditions, including those nested in groups.
    pub fn condition_count(&self) -> usize {
        self.filters.iter().map(FilterNode::condition_count).sum()
    }
}

impl FilterNode {
    fn check_values(&self, path: &str) -> Result<(), FilterError> {
        match self {
            FilterNode::Condition(condition) => condition.check_value(path),
            FilterNode::Group(group) => {
                group.members.iter().enumerate().try_for_each(|(j, member)| {
                    member.check_values(&format!("{}.{}[{}]", path, group.combinator, j))
                })
            }
        }
    }

    fn condition_count(&self) -> usize {
        match self {
            FilterNode::Condition(_) => 1,
            FilterNode::Group(group) => group.members.iter().map(Self::condition_count).sum(),
        }
    }
}

impl FilterCondition {
    fn check_value(&self, path: &str) -> Result<(), FilterError> {
        if self.operator.accepts_value(&self.value) {
            return Ok(());
        }
        Err(FilterError::InvalidValue {
            path: path.to_string(),
            operator: self.operator,
            expected: self.operator.value_shape().describe(),
        })
    }
}

/// Syntactic check of a raw filter. `true` means it may be forwarded.
///
/// Boolean view of [`parse`]. The canonical form of an accepted filter always
/// passes it again.
pub fn validate(expr: &Value) -> bool {
    parse(expr).is_ok()
}

/// Validate a raw filter and decode it.
///
/// Returns `Ok(None)` for inputs that mean "no filter". Both the current and
/// the legacy list are validated when present, so neither can smuggle an
/// unchecked expression to the engine.
pub fn parse(expr: &Value) -> Result<Option<FilterExpression>, FilterError> {
    let Value::Object(object) = expr else {
        return Ok(None);
    };

    let legacy = canonical::legacy_filters(expr)
        .map(|members| parse_members(members, "filter.filters"))
        .transpose()?;

    let current = match object.get("filters") {
        Some(Value::Array(members)) => Some(parse_members(members, "filters")?),
        _ => None,
    };

    Ok(legacy.or(current).map(|filters| FilterExpression { filters }))
}

fn parse_members(members: &[Value], root: &str) -> Result<Vec<FilterNode>, FilterError> {
    members
        .iter()
        .enumerate()
        .map(|(i, member)| parse_member(member, &format!("{}[{}]", root, i)))
        .collect()
}

fn parse_member(member: &Value, path: &str) -> Result<FilterNode, FilterError> {
    let Value::Object(fields) = member else {
        return Err(FilterError::UnrecognizedMember {
            path: path.to_string(),
        });
    };

    if let Some(condition) = parse_condition(fields, path)? {
        return Ok(FilterNode::Condition(condition));
    }

    let and = fields.get("and").filter(|v| !v.is_null());
    let or = fields.get("or").filter(|v| !v.is_null());

    match (and, or) {
        (Some(_), Some(_)) => Err(FilterError::AmbiguousGroup {
            path: path.to_string(),
        }),
        (Some(members), None) => parse_group(Combinator::And, members, path),
        (None, Some(members)) => parse_group(Combinator::Or, members, path),
        (None, None) => Err(FilterError::UnrecognizedMember {
            path: path.to_string(),
        }),
    }
}

/// `Ok(None)` when the object lacks a field or an operator, i.e. it is not
/// shaped like a condition at all.
fn parse_condition(
    fields: &Map<String, Value>,
    path: &str,
) -> Result<Option<FilterCondition>, FilterError> {
    let field = fields
        .get("field")
        .and_then(Value::as_str)
        .filter(|f| !f.is_empty());
    let operator = fields.get("operator").filter(|op| is_truthy(op));

    let (Some(field), Some(operator)) = (field, operator) else {
        return Ok(None);
    };

    let parsed = operator
        .as_str()
        .and_then(|op| op.parse::<Operator>().ok())
        .ok_or_else(|| FilterError::UnknownOperator {
            path: path.to_string(),
            operator: operator.to_string(),
        })?;

    Ok(Some(FilterCondition {
        field: field.to_string(),
        operator: parsed,
        value: fields.get("value").cloned().unwrap_or(Value::Null),
    }))
}

fn parse_group(
    combinator: Combinator,
    members: &Value,
    path: &str,
) -> Result<FilterNode, FilterError> {
    let group_path = format!("{}.{}", path, combinator);
    let Value::Array(members) = members else {
        return Err(FilterError::GroupNotList { path: group_path });
    };

    let members = members
        .iter()
        .enumerate()
        .map(|(j, member)| {
            let member_path = format!("{}[{}]", group_path, j);
            let condition = match member {
                Value::Object(fields) => parse_condition(fields, &member_path)?,
                _ => None,
            };
            match condition {
                Some(condition) => Ok(FilterNode::Condition(condition)),
                None => Err(FilterError::InvalidGroupMember { path: member_path }),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FilterNode::Group(FilterGroup {
        combinator,
        members,
    }))
}
