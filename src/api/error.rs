use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::core::errors::FlavorError;

/// HTTP face of a [`FlavorError`].
#[derive(Debug)]
pub struct ErrorResponse(pub FlavorError);

impl From<FlavorError> for ErrorResponse {
    fn from(err: FlavorError) -> Self {
        Self(err)
    }
}

impl ErrorResponse {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            FlavorError::Validation(_) => StatusCode::BAD_REQUEST,
            FlavorError::Topology(_) => StatusCode::CONFLICT,
            FlavorError::ClusterQuery { .. } | FlavorError::Connect(_) => StatusCode::BAD_GATEWAY,
            FlavorError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "flavor call failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
