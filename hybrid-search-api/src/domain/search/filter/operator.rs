//! The closed set of filter operators understood by the query engine.

use serde_json::Value;
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Comparison operator of a filter condition.
///
/// Parsing is case-sensitive: `"eq"` is accepted, `"EQ"` is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    In,
    Contains,
    Is,
    Not,
    Fts,
    Match,
}

/// Value shape an operator expects when strict value checking is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// String, number, bool or null.
    Scalar,
    /// Number or string (dates are compared as ISO strings).
    Comparable,
    Text,
    /// Array whose items are all scalars.
    ScalarList,
    NullOrBool,
    Any,
}

impl ValueShape {
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ValueShape::Scalar => is_scalar(value),
            ValueShape::Comparable => value.is_number() || value.is_string(),
            ValueShape::Text => value.is_string(),
            ValueShape::ScalarList => value
                .as_array()
                .is_some_and(|items| items.iter().all(is_scalar)),
            ValueShape::NullOrBool => value.is_null() || value.is_boolean(),
            ValueShape::Any => true,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            ValueShape::Scalar => "a string, number, boolean or null",
            ValueShape::Comparable => "a number or string",
            ValueShape::Text => "a string",
            ValueShape::ScalarList => "an array of strings, numbers, booleans or nulls",
            ValueShape::NullOrBool => "null or a boolean",
            ValueShape::Any => "any value",
        }
    }
}

impl Operator {
    pub fn value_shape(self) -> ValueShape {
        match self {
            Operator::Eq | Operator::Neq => ValueShape::Scalar,
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => ValueShape::Comparable,
            Operator::Like | Operator::Ilike | Operator::Fts | Operator::Match => ValueShape::Text,
            Operator::In => ValueShape::ScalarList,
            Operator::Is => ValueShape::NullOrBool,
            Operator::Contains | Operator::Not => ValueShape::Any,
        }
    }

    pub fn accepts_value(self, value: &Value) -> bool {
        self.value_shape().accepts(value)
    }
}

fn is_scalar(value: &Value) -> bool {
    !value.is_array() && !value.is_object()
}
