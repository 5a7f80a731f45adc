use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use super::{ApiError, AppState};

/// The authenticated account a browser-facing request acts for.
///
/// Session establishment lives in the fronting web tier; it forwards the
/// resolved account id in `x-user-id`. When the config carries a bearer
/// token, the `Authorization` header must match it as well. Anything short
/// of that is a 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionUser(pub i64);

#[async_trait::async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(expected) = &state.auth_bearer_token {
            let presented = parts
                .headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "));
            if presented != Some(expected.as_str()) {
                return Err(ApiError::Unauthorized);
            }
        }

        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|id| *id > 0)
            .ok_or(ApiError::Unauthorized)?;

        Ok(SessionUser(user_id))
    }
}
