//! Helpers shared by the catalog modules.

use axum::response::{IntoResponse, Response};
use serde_json::{json, Map, Value};
use time::{format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime};

/// Parse `YYYY-MM-DD` or an RFC 3339 timestamp, keeping the date part.
pub fn parse_iso_date(raw: &str) -> Option<Date> {
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .or_else(|| OffsetDateTime::parse(raw, &Rfc3339).ok().map(|dt| dt.date()))
}

/// Human-readable date such as `Jan 5, 1920`; empty when absent.
pub fn display_date(date: Option<Date>) -> String {
    date.and_then(|date| {
        date.format(format_description!(
            "[month repr:short] [day padding:none], [year]"
        ))
        .ok()
    })
    .unwrap_or_default()
}

/// Serde adapter storing optional dates as `YYYY-MM-DD` strings.
pub mod optional_date {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_some(&date.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Date>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .filter(|raw| !raw.is_empty())
            .map(|raw| {
                super::parse_iso_date(&raw)
                    .ok_or_else(|| D::Error::custom(format!("invalid date '{raw}'")))
            })
            .transpose()
    }
}

/// Fixed response for operations that are declared but have no behaviour.
pub fn not_implemented(operation: &str) -> Response {
    format!("NOT IMPLEMENTED: {operation}").into_response()
}

/// OpenAPI `paths` fragment listing `(method, path, summary)` endpoints under one tag.
pub fn openapi_paths(tag: &str, endpoints: &[(&str, &str, &str)]) -> Value {
    let mut paths = Map::new();
    for (method, path, summary) in endpoints {
        let item = paths
            .entry(path.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        item[*method] = json!({
            "summary": summary,
            "tags": [tag],
            "responses": {
                "200": { "description": "Rendered view" },
                "303": { "description": "Redirect after a successful write" },
                "404": { "description": "Record not found" }
            }
        });
    }
    json!({ "paths": paths })
}
