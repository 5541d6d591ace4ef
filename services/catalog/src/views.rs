//! View models
//!
//! Page templates are not rendered here. Each handler returns the name of
//! the page and the context the page needs, serialized as JSON.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

/// A named page and its context
#[derive(Debug, Clone, Serialize)]
pub struct View {
    pub view: &'static str,
    pub context: Value,
}

impl View {
    pub fn render(view: &'static str, context: Value) -> Self {
        Self { view, context }
    }
}

impl IntoResponse for View {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
