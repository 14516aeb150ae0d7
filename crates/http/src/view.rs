//! View rendering contract.
//!
//! Handlers describe what to show as a named [`View`] with a data payload and
//! hand it to a [`ViewRenderer`], which turns it into a response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to serialize '{key}' for view '{view}': {source}")]
    Payload {
        view: String,
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A named view plus the payload it is rendered with.
#[derive(Debug)]
pub struct View {
    name: String,
    status: StatusCode,
    data: Map<String, Value>,
    error: Option<RenderError>,
}

impl View {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        let mut data = Map::new();
        data.insert("title".to_string(), Value::String(title.into()));
        Self {
            name: name.into(),
            status: StatusCode::OK,
            data,
            error: None,
        }
    }

    /// Attach a payload entry. Serialization failures surface at render time.
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.data.insert(key.to_string(), value);
            }
            Err(source) => {
                if self.error.is_none() {
                    self.error = Some(RenderError::Payload {
                        view: self.name.clone(),
                        key: key.to_string(),
                        source,
                    });
                }
            }
        }
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Consume the view, yielding its payload or the first serialization error.
    pub fn into_parts(self) -> Result<(String, StatusCode, Map<String, Value>), RenderError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok((self.name, self.status, self.data)),
        }
    }
}

/// Turns views into HTTP responses.
pub trait ViewRenderer: Send + Sync {
    fn render(&self, view: View) -> Result<Response, RenderError>;
}

/// Renders views as JSON documents: `{"view": name, "title": ..., ...payload}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl ViewRenderer for JsonRenderer {
    fn render(&self, view: View) -> Result<Response, RenderError> {
        let (name, status, mut data) = view.into_parts()?;
        data.insert("view".to_string(), Value::String(name));
        Ok((status, Json(Value::Object(data))).into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("refused"))
        }
    }

    #[tokio::test]
    async fn json_renderer_flattens_payload() {
        let view = View::new("genre_list", "Genre List")
            .with("genre_list", vec!["Fantasy", "Poetry"])
            .with_status(StatusCode::UNPROCESSABLE_ENTITY);

        let response = JsonRenderer.render(view).unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["view"], "genre_list");
        assert_eq!(body["title"], "Genre List");
        assert_eq!(body["genre_list"][1], "Poetry");
    }

    #[test]
    fn payload_errors_surface_on_render() {
        let view = View::new("index", "Home").with("broken", Unserializable);
        assert!(matches!(
            JsonRenderer.render(view),
            Err(RenderError::Payload { ref key, .. }) if key == "broken"
        ));
    }
}
