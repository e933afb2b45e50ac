//! Request extractors.

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use potluck_common::AppError;
use serde::de::DeserializeOwned;

/// Header carrying the caller's id when the body or query has none.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Caller id from the `X-User-Id` header, if any.
#[derive(Debug, Clone, Default)]
pub struct HeaderCaller(pub Option<String>);

impl HeaderCaller {
    /// Prefer an explicit id from the body or query, then the header.
    #[must_use]
    pub fn or_explicit(self, explicit: Option<String>) -> Option<String> {
        explicit
            .filter(|id| !id.trim().is_empty())
            .or(self.0)
    }
}

impl<S> FromRequestParts<S> for HeaderCaller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let caller = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(ToString::to_string);

        Ok(Self(caller))
    }
}

/// JSON body that tolerates a missing body or content type.
///
/// `DELETE` requests from browsers often arrive without either; an empty
/// body deserializes to `T::default()`.
#[derive(Debug, Clone, Default)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }

        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))
    }
}
