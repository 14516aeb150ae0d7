//! Declarative form validation and sanitization.
//!
//! Each field owns an ordered list of steps. A step either checks the current
//! value against a predicate (recording its message on failure) or rewrites the
//! value. Every field is processed and all failures are collected before the
//! caller decides whether to persist anything.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use time::Date;

use crate::utils::parse_iso_date;

pub type Predicate = fn(&str) -> bool;
pub type Sanitizer = fn(&str) -> String;

/// Raw `application/x-www-form-urlencoded` submission, repeated keys included.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    pub fn values<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(key, _)| key == field)
            .map(|(_, value)| value.as_str())
    }
}

impl From<Vec<(String, String)>> for FormData {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }
}

impl<const N: usize> From<[(&str, &str); N]> for FormData {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self {
            pairs: pairs
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        }
    }
}

/// One rejected value, shaped for re-rendered forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub param: String,
    pub msg: String,
    pub value: String,
}

#[derive(Clone, Copy)]
enum Step {
    Check {
        predicate: Predicate,
        message: &'static str,
    },
    Sanitize(Sanitizer),
}

/// Ordered rules for a single form field.
pub struct FieldRules {
    name: &'static str,
    optional: bool,
    multiple: bool,
    steps: Vec<Step>,
}

impl FieldRules {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            optional: false,
            multiple: false,
            steps: Vec::new(),
        }
    }

    /// Skip checks when the submitted value is blank.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Process every submitted value instead of the first one.
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    pub fn check(mut self, predicate: Predicate, message: &'static str) -> Self {
        self.steps.push(Step::Check { predicate, message });
        self
    }

    pub fn sanitize(mut self, sanitizer: Sanitizer) -> Self {
        self.steps.push(Step::Sanitize(sanitizer));
        self
    }

    pub fn trim(self) -> Self {
        self.sanitize(trim)
    }

    pub fn escape(self) -> Self {
        self.sanitize(escape)
    }

    pub fn non_empty(self, message: &'static str) -> Self {
        self.check(|value| !value.is_empty(), message)
    }

    pub fn alphanumeric(self, message: &'static str) -> Self {
        self.check(is_alphanumeric, message)
    }

    pub fn iso8601(self, message: &'static str) -> Self {
        self.check(is_iso8601, message)
    }

    fn apply(&self, raw: &str, errors: &mut Vec<FieldError>) -> String {
        let skip_checks = self.optional && raw.trim().is_empty();
        let mut value = raw.to_string();
        for step in &self.steps {
            match step {
                Step::Sanitize(sanitizer) => value = sanitizer(&value),
                Step::Check { .. } if skip_checks => {}
                Step::Check { predicate, message } => {
                    if !predicate(&value) {
                        errors.push(FieldError {
                            param: self.name.to_string(),
                            msg: message.to_string(),
                            value: value.clone(),
                        });
                    }
                }
            }
        }
        value
    }
}

/// The full rule set for one form.
#[derive(Default)]
pub struct Rules {
    fields: Vec<FieldRules>,
}

impl Rules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, rules: FieldRules) -> Self {
        self.fields.push(rules);
        self
    }

    pub fn validate(&self, form: &FormData) -> Validated {
        let mut validated = Validated::default();
        for field in &self.fields {
            let raw: Vec<&str> = if field.multiple {
                form.values(field.name).collect()
            } else {
                vec![form.values(field.name).next().unwrap_or_default()]
            };
            let values = raw
                .into_iter()
                .map(|value| field.apply(value, &mut validated.errors))
                .collect();
            validated.values.insert(field.name, values);
        }
        validated
    }
}

/// Sanitized values plus every recorded failure.
#[derive(Debug, Default)]
pub struct Validated {
    values: BTreeMap<&'static str, Vec<String>>,
    errors: Vec<FieldError>,
}

impl Validated {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// First sanitized value of `field`, empty when absent.
    pub fn value(&self, field: &str) -> &str {
        self.values(field)
            .first()
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn values(&self, field: &str) -> &[String] {
        self.values
            .get(field)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The field coerced to a date; blank or unparsable values give `None`.
    pub fn date(&self, field: &str) -> Option<Date> {
        parse_iso_date(self.value(field))
    }

    /// Sanitized values keyed by field, for pre-filling a re-rendered form.
    pub fn echo(&self) -> Map<String, Value> {
        self.values
            .iter()
            .map(|(field, values)| {
                let value = match values.as_slice() {
                    [single] => Value::String(single.clone()),
                    many => Value::from(many.to_vec()),
                };
                (field.to_string(), value)
            })
            .collect()
    }
}

pub fn trim(value: &str) -> String {
    value.trim().to_string()
}

/// Replace markup-significant characters with HTML entities.
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '/' => escaped.push_str("&#x2F;"),
            '\\' => escaped.push_str("&#x5C;"),
            '`' => escaped.push_str("&#96;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub fn is_alphanumeric(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric())
}

pub fn is_iso8601(value: &str) -> bool {
    parse_iso_date(value).is_some()
}
