//! Response shaping.
//!
//! # Responsibilities
//! - Map coordinator error kinds to HTTP status codes
//! - Render errors as `{"kind", "message"}` JSON bodies

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::grants::CoordinatorError;

#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub kind: &'a str,
    pub message: String,
}

pub fn status_for(err: &CoordinatorError) -> StatusCode {
    match err {
        CoordinatorError::Validation(_) | CoordinatorError::Encoding(_) => StatusCode::BAD_REQUEST,
        CoordinatorError::NotFound(_) | CoordinatorError::Simulation(_) => StatusCode::NOT_FOUND,
        CoordinatorError::Network(_) => StatusCode::BAD_GATEWAY,
        CoordinatorError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for CoordinatorError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            kind: self.kind(),
            message: self.to_string(),
        };
        (status_for(&self), Json(body)).into_response()
    }
}
