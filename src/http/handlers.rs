//! Route handlers.
//!
//! Each handler parses its path/body, delegates to the reconciler and
//! records one request metric. No business logic lives here.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use serde_json::json;
use std::time::Instant;

use crate::grants::types::{
    ApproveMilestoneRequest, ClaimPaymentRequest, ConfirmGrantRequest, CreateGrantRequest,
    GrantId, MilestoneId, RegisterMilestoneRequest,
};
use crate::grants::{CoordinatorError, CoordinatorResult};
use crate::http::request::{RequestId, ValidatedJson};
use crate::http::response::status_for;
use crate::http::server::AppState;
use crate::observability::metrics;

fn respond<T: Serialize>(
    operation: &'static str,
    request_id: &RequestId,
    start: Instant,
    success: StatusCode,
    result: CoordinatorResult<T>,
) -> Response {
    match result {
        Ok(body) => {
            metrics::record_request(operation, success.as_u16(), start);
            (success, Json(body)).into_response()
        }
        Err(err) => {
            let status = status_for(&err);
            if status.is_server_error() {
                tracing::error!(request_id = %request_id, operation, kind = err.kind(), error = %err, "Request failed");
            } else {
                tracing::debug!(request_id = %request_id, operation, kind = err.kind(), error = %err, "Request rejected");
            }
            metrics::record_request(operation, status.as_u16(), start);
            err.into_response()
        }
    }
}

fn parse_local_id(raw: &str) -> CoordinatorResult<i64> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| CoordinatorError::Validation(format!("Invalid grant record id '{}'", raw)))
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn get_grant(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(grant_id): Path<String>,
) -> Response {
    let start = Instant::now();
    let result = async {
        let grant_id: GrantId = grant_id.parse()?;
        state.reconciler.get_grant(grant_id).await
    }
    .await;
    respond("get_grant", &request_id, start, StatusCode::OK, result)
}

pub async fn get_milestone(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path((grant_id, milestone_id)): Path<(String, String)>,
) -> Response {
    let start = Instant::now();
    let result = async {
        let grant_id: GrantId = grant_id.parse()?;
        let milestone_id: MilestoneId = milestone_id.parse()?;
        state.reconciler.get_milestone(grant_id, milestone_id).await
    }
    .await;
    respond("get_milestone", &request_id, start, StatusCode::OK, result)
}

pub async fn create_grant(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Result<ValidatedJson<CreateGrantRequest>, CoordinatorError>,
) -> Response {
    let start = Instant::now();
    let result = match body {
        Ok(ValidatedJson(req)) => state.reconciler.create_grant(req).await,
        Err(e) => Err(e),
    };
    respond("create_grant", &request_id, start, StatusCode::CREATED, result)
}

pub async fn build_register_milestone(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Result<ValidatedJson<RegisterMilestoneRequest>, CoordinatorError>,
) -> Response {
    let start = Instant::now();
    let result = match body {
        Ok(ValidatedJson(req)) => state.reconciler.build_register_milestone(req).await,
        Err(e) => Err(e),
    };
    respond("register_milestone", &request_id, start, StatusCode::OK, result)
}

pub async fn build_approve_milestone(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Result<ValidatedJson<ApproveMilestoneRequest>, CoordinatorError>,
) -> Response {
    let start = Instant::now();
    let result = match body {
        Ok(ValidatedJson(req)) => state.reconciler.build_approve_milestone(req).await,
        Err(e) => Err(e),
    };
    respond("approve_milestone", &request_id, start, StatusCode::OK, result)
}

pub async fn build_claim_payment(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Result<ValidatedJson<ClaimPaymentRequest>, CoordinatorError>,
) -> Response {
    let start = Instant::now();
    let result = match body {
        Ok(ValidatedJson(req)) => state.reconciler.build_claim_payment(req).await,
        Err(e) => Err(e),
    };
    respond("claim_payment", &request_id, start, StatusCode::OK, result)
}

pub async fn confirm_grant(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(local_id): Path<String>,
    body: Result<ValidatedJson<ConfirmGrantRequest>, CoordinatorError>,
) -> Response {
    let start = Instant::now();
    let result = async {
        let local_id = parse_local_id(&local_id)?;
        let ValidatedJson(req) = body?;
        state
            .reconciler
            .confirm_grant(local_id, req.on_chain_id, req.tx_hash.as_deref())
            .await
    }
    .await;
    respond("confirm_grant", &request_id, start, StatusCode::OK, result)
}
