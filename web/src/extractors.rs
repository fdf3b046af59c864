//! Custom Axum extractors.
//!
//! - [`Identity`]: the verified caller, as asserted by the identity gateway
//! - [`CorrelationId`]: the request's correlation ID
//!
//! # Examples
//!
//! ```ignore
//! use seatbook_web::extractors::{CorrelationId, Identity};
//!
//! async fn handler(
//!     Identity(caller): Identity,
//!     correlation_id: CorrelationId,
//! ) -> Result<Json<Response>, AppError> {
//!     tracing::info!(correlation_id = %correlation_id.0, person = %caller.person, "Processing request");
//!     Ok(Json(response))
//! }
//! ```

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use seatbook_core::{Caller, PersonId, Role};
use uuid::Uuid;

/// Header carrying the caller's person id (UUID).
pub const PERSON_ID_HEADER: &str = "X-Person-Id";

/// Header carrying the caller's role (`member` or `administrator`).
pub const PERSON_ROLE_HEADER: &str = "X-Person-Role";

/// Correlation ID for request tracing.
///
/// Reads the ID stored by the correlation middleware, falling back to the
/// `X-Correlation-ID` header, or generates a new UUID v4.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let correlation_id = parts
            .extensions
            .get::<Uuid>()
            .copied()
            .or_else(|| {
                parts
                    .headers
                    .get(CORRELATION_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| Uuid::parse_str(s).ok())
            })
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

/// The verified caller.
///
/// The gateway in front of the service authenticates the user and forwards
/// `X-Person-Id` and `X-Person-Role`. Both are trusted as-is. A missing or
/// malformed header is rejected with 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity(pub Caller);

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        caller_from_headers(&parts.headers).map(Self)
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::unauthorized(format!("Missing {name} header")))
}

/// Parse the identity headers into a [`Caller`].
///
/// # Errors
///
/// Returns a 401 [`AppError`] if either header is missing or malformed.
pub fn caller_from_headers(headers: &HeaderMap) -> Result<Caller, AppError> {
    let person: PersonId = header(headers, PERSON_ID_HEADER)?
        .parse()
        .map_err(|_| AppError::unauthorized(format!("Invalid {PERSON_ID_HEADER} header")))?;
    let role: Role = header(headers, PERSON_ROLE_HEADER)?
        .parse()
        .map_err(|_| AppError::unauthorized(format!("Invalid {PERSON_ROLE_HEADER} header")))?;
    Ok(Caller::new(person, role))
}
