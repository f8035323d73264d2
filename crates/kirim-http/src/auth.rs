use axum::http::HeaderMap;

use crate::error::ApiError;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Shared-secret check, run before any other request processing.
pub(crate) fn require_api_key(headers: &HeaderMap, expected: &str) -> Result<(), ApiError> {
    let provided = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !expected.is_empty() && provided == expected {
        Ok(())
    } else {
        Err(kirim_core::Error::Unauthorized.into())
    }
}
