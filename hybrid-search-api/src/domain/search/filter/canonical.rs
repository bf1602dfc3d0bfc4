//! Canonical form of a metadata filter, as consumed by the query engine.
//!
//! Clients may send either the current shape `{"filters": [...]}` or the
//! legacy doubly-nested shape `{"filter": {"filters": [...]}}`. Both collapse
//! to `{"filters": [...]}` here; knowledge of the legacy shape stays in this
//! module.

use serde::Serialize;
use serde_json::{json, Map, Value};

/// Filter in the single shape the query engine expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CanonicalFilter(Value);

impl CanonicalFilter {
    /// The "match everything" filter, `{}`.
    pub fn empty() -> Self {
        Self(Value::Object(Map::new()))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Whether the filter restricts the result set at all.
    pub fn is_applied(&self) -> bool {
        match &self.0 {
            Value::Object(map) => !map.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::String(s) => !s.is_empty(),
            _ => false,
        }
    }
}

impl Default for CanonicalFilter {
    fn default() -> Self {
        Self::empty()
    }
}

/// Rewrite a filter into its canonical shape. Never fails.
///
/// Shapes that are not recognized pass through unchanged so that newer
/// engine-side filter formats keep working.
pub fn canonicalize(expr: &Value) -> CanonicalFilter {
    if !is_truthy(expr) {
        return CanonicalFilter::empty();
    }

    if let Some(filters) = legacy_filters(expr) {
        return CanonicalFilter(json!({ "filters": filters }));
    }

    match expr.get("filters") {
        Some(filters @ Value::Array(_)) => CanonicalFilter(json!({ "filters": filters })),
        _ => CanonicalFilter(expr.clone()),
    }
}

/// Filter list of the legacy `{"filter": {"filters": [...]}}` shape.
pub(super) fn legacy_filters(expr: &Value) -> Option<&Vec<Value>> {
    expr.get("filter")?.get("filters")?.as_array()
}

/// Loose truthiness used by the request contract: `null`, `false`, `0` and
/// `""` count as absent.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
