//! # Authentication Module
//!
//! Bearer-token authentication for the assessor HTTP API.
//!
//! When `SAMD_SERVER_API_KEY` is set, every route except `/health` requires:
//! ```text
//! Authorization: Bearer <key>
//! ```

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

/// The configured server key, shared by the middleware.
pub type ServerKey = Arc<str>;

/// Reject requests whose bearer token does not match `expected`.
pub async fn api_key_auth_middleware(
    State(expected): State<ServerKey>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    if request.uri().path() == "/health" {
        return Ok(next.run(request).await);
    }

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v));

    let Some(provided) = provided else {
        tracing::warn!(
            event = "auth_failure",
            reason = "missing_authorization_header",
            "Missing Authorization header"
        );
        return Err((StatusCode::UNAUTHORIZED, "Unauthorized"));
    };

    if keys_match(provided, &expected) {
        Ok(next.run(request).await)
    } else {
        tracing::warn!(
            event = "auth_failure",
            reason = "invalid_api_key",
            "Authentication failed: invalid API key"
        );
        Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
    }
}

/// Constant-time key comparison. Both keys are zero-padded to the same
/// length so the comparison cost does not depend on where they differ.
fn keys_match(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    let len = provided.len().max(expected.len());

    let mut a = vec![0u8; len];
    let mut b = vec![0u8; len];
    a[..provided.len()].copy_from_slice(provided);
    b[..expected.len()].copy_from_slice(expected);

    let same_bytes: bool = a.ct_eq(&b).into();
    same_bytes && provided.len() == expected.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_keys_match() {
        assert!(keys_match("s3cret", "s3cret"));
    }

    #[test]
    fn prefix_of_key_does_not_match() {
        assert!(!keys_match("s3c", "s3cret"));
        assert!(!keys_match("s3cret\0", "s3cret"));
    }

    #[test]
    fn empty_key_does_not_match() {
        assert!(!keys_match("", "s3cret"));
    }
}
