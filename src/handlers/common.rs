use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::errors::ServiceError;

/// The acting principal, taken from the `X-Actor-Name` header set by the
/// gateway. Threaded explicitly into every mutating service call; there is
/// no implicit "current admin" fallback.
#[derive(Debug, Clone)]
pub struct Principal(pub String);

impl Principal {
    pub fn name(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get("x-actor-name")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ServiceError::Unauthorized("Missing X-Actor-Name header".to_string())
            })?;

        Ok(Principal(value.to_string()))
    }
}

/// Clamps raw pagination query values to sane bounds.
pub fn pagination(page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
    (page.unwrap_or(1).max(1), limit.unwrap_or(20).clamp(1, 100))
}
