//! Caller identity, as resolved by the fronting auth service.
//!
//! Credentials are never parsed here: the gateway terminates them and
//! forwards the resolved `{ user_id, is_admin }` pair in trusted headers.
//! Mutating routes extract [`Identity`] (401 when missing); reads extract
//! [`MaybeIdentity`] and treat a missing pair as an anonymous caller. A
//! malformed header is rejected everywhere.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;
use crate::models::Identity;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ADMIN_HEADER: &str = "x-user-admin";

/// Identity for routes that also serve anonymous callers.
#[derive(Debug, Clone, Copy)]
pub struct MaybeIdentity(pub Option<Identity>);

fn identity_from_parts(parts: &Parts) -> Result<Option<Identity>, ApiError> {
    let Some(raw_id) = parts.headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };
    let user_id: i64 = raw_id
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| ApiError::unauthorized(format!("invalid {USER_ID_HEADER} header")))?;

    let is_admin = match parts.headers.get(USER_ADMIN_HEADER) {
        None => false,
        Some(raw) => {
            let value = raw
                .to_str()
                .map_err(|_| ApiError::unauthorized(format!("invalid {USER_ADMIN_HEADER} header")))?;
            match value.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => true,
                "false" | "0" | "" => false,
                _ => {
                    return Err(ApiError::unauthorized(format!(
                        "invalid {USER_ADMIN_HEADER} header"
                    )))
                }
            }
        }
    };

    Ok(Some(Identity { user_id, is_admin }))
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity_from_parts(parts)?
            .ok_or_else(|| ApiError::unauthorized("authentication required"))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeIdentity(identity_from_parts(parts)?))
    }
}
