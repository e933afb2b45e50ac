//! API response types.

#![allow(missing_docs)]

use axum::{Json, http::StatusCode};
use serde::Serialize;

/// Body carrying only a human readable message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// A payload with a message merged into the same JSON object.
#[derive(Debug, Serialize)]
pub struct WithMessage<T: Serialize> {
    pub message: &'static str,
    #[serde(flatten)]
    pub data: T,
}

#[must_use]
pub fn message(message: &'static str) -> Json<MessageResponse> {
    Json(MessageResponse { message })
}

#[must_use]
pub fn with_message<T: Serialize>(message: &'static str, data: T) -> Json<WithMessage<T>> {
    Json(WithMessage { message, data })
}

/// 201 with a JSON body.
#[must_use]
pub fn created<T: Serialize>(body: Json<T>) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, body)
}
