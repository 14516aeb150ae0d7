//! Filters, sort keys and projections understood by every [`crate::DocumentStore`].

use std::cmp::Ordering;

use serde_json::Value;

/// Conjunction of equality conditions on top-level document fields.
///
/// A condition on an array field matches when the array contains the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// Filter matching every document.
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter matching documents whose `field` equals `value`.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and(field, value)
    }

    pub fn and(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    pub fn matches(&self, document: &Value) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| match document.get(field) {
                Some(Value::Array(items)) => items.contains(expected),
                Some(actual) => actual == expected,
                None => expected.is_null(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Sort key applied to a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

impl Sort {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Descending,
        }
    }

    pub fn compare(&self, left: &Value, right: &Value) -> Ordering {
        let ordering = compare_values(
            left.get(&self.field).unwrap_or(&Value::Null),
            right.get(&self.field).unwrap_or(&Value::Null),
        );
        match self.order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}

/// Keep `id` plus the listed fields of an object document.
pub fn project(document: Value, fields: &[&str]) -> Value {
    match document {
        Value::Object(mut map) => {
            map.retain(|key, _| key == "id" || fields.contains(&key.as_str()));
            Value::Object(map)
        }
        other => other,
    }
}

// Missing and null values sort first, then booleans, numbers and strings.
fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or_default();
            let b = b.as_f64().unwrap_or_default();
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => type_rank(left).cmp(&type_rank(right)),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
