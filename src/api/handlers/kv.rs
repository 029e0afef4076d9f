//! Create/read/update/delete handlers.
//!
//! Each handler runs the same pipeline: decode the JSON body, validate the
//! key, assign an identifier, issue one backend command, then serialize the
//! response. A failure at any step ends the request; nothing is retried.
//!
//! Counting: the operation counter moves only once a response body has been
//! produced. Every failure adds one to `errors`, except method rejections,
//! which only move `rejected`.

use axum::{
    extract::State,
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::api::state::AppState;
use crate::domain::{KeyRequest, Operation, RecordResponse, WriteRequest};
use crate::error::{AppError, Result};
use crate::service::Counter;

/// `POST /create`
pub async fn create(State(state): State<AppState>, body: Bytes) -> Response {
    let outcome = write(&state, Operation::Create, &body).await;
    respond(&state, Operation::Create, outcome)
}

/// `POST /read`
pub async fn read(State(state): State<AppState>, body: Bytes) -> Response {
    let outcome = fetch(&state, &body).await;
    respond(&state, Operation::Read, outcome)
}

/// `POST /update`
pub async fn update(State(state): State<AppState>, body: Bytes) -> Response {
    let outcome = write(&state, Operation::Update, &body).await;
    respond(&state, Operation::Update, outcome)
}

/// `POST /delete`
pub async fn delete(State(state): State<AppState>, body: Bytes) -> Response {
    let outcome = remove(&state, &body).await;
    respond(&state, Operation::Delete, outcome)
}

/// Fallback for any verb an endpoint does not accept.
pub async fn method_not_allowed(State(state): State<AppState>, method: Method) -> Response {
    state.metrics.increment(Counter::Rejected);
    AppError::MethodNotAllowed(method.to_string()).into_response()
}

#[instrument(skip_all, fields(operation = %operation))]
async fn write(state: &AppState, operation: Operation, body: &[u8]) -> Result<RecordResponse> {
    let request: WriteRequest = decode(body)?;
    request.validate()?;

    let uid = state.ids.next_id()?;
    debug!(uid, key = %request.key, "Accepted");

    state.backend.set(&request.key, &request.value).await?;

    Ok(RecordResponse::with_value(uid, request.key, request.value))
}

#[instrument(skip_all, fields(operation = "read"))]
async fn fetch(state: &AppState, body: &[u8]) -> Result<RecordResponse> {
    let request: KeyRequest = decode(body)?;
    request.validate()?;

    let uid = state.ids.next_id()?;
    debug!(uid, key = %request.key, "Accepted");

    let value = state
        .backend
        .get(&request.key)
        .await?
        .ok_or_else(|| AppError::KeyNotFound(request.key.clone()))?;

    Ok(RecordResponse::with_value(uid, request.key, value))
}

#[instrument(skip_all, fields(operation = "delete"))]
async fn remove(state: &AppState, body: &[u8]) -> Result<RecordResponse> {
    let request: KeyRequest = decode(body)?;
    request.validate()?;

    let uid = state.ids.next_id()?;
    debug!(uid, key = %request.key, "Accepted");

    let removed = state.backend.delete(&request.key).await?;
    if removed == 0 {
        state.metrics.increment(Counter::Warnings);
        warn!(uid, key = %request.key, "Deleted key did not exist");
    }

    Ok(RecordResponse::without_value(uid, request.key))
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| AppError::MalformedBody(e.to_string()))
}

/// Serialize the outcome and update counters.
///
/// The body is fully encoded before anything is written, so an encoding
/// failure produces a clean 500.
fn respond(state: &AppState, operation: Operation, outcome: Result<RecordResponse>) -> Response {
    let encoded = outcome.and_then(|response| {
        let body = serde_json::to_vec(&response)?;
        Ok((response.uid, body))
    });

    match encoded {
        Ok((uid, body)) => {
            state.metrics.increment(operation.counter());
            debug!(uid, %operation, "Completed");
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response()
        }
        Err(err) => {
            if err.counts_as_error() {
                state.metrics.increment(Counter::Errors);
            }
            err.into_response()
        }
    }
}
