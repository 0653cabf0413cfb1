//! Request handling.
//!
//! # Responsibilities
//! - Assign a request ID (UUID v4) when the client sent none
//! - Echo the request ID on the response
//! - Deserialize JSON bodies, reporting failures as validation errors
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Body rejections never leak axum's plain-text responses

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::HeaderValue,
    middleware::Next,
    response::Response,
    Json,
};
use uuid::Uuid;

use crate::grants::CoordinatorError;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Correlation ID attached to every request's extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Middleware that ensures each request carries an `x-request-id`.
pub async fn request_id_middleware(mut req: Request<Body>, next: Next) -> Response {
    let id = req
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let header = HeaderValue::from_str(&id).ok();
    if let Some(value) = &header {
        req.headers_mut().insert(X_REQUEST_ID, value.clone());
    }
    req.extensions_mut().insert(RequestId(id));

    let mut response = next.run(req).await;
    if let Some(value) = header {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}

/// JSON body extractor whose rejection is a `CoordinatorError::Validation`.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = CoordinatorError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidatedJson(value)),
            Err(rejection) => Err(CoordinatorError::Validation(rejection.body_text())),
        }
    }
}
