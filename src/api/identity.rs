// Identity extraction - the fronting authentication layer forwards the
// caller's user id and held roles as request headers; this extractor
// turns them into an Identity and rejects unauthenticated requests.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::core::access;
use crate::error::{AppError, AppResult};
use crate::models::Identity;

const USER_ID_HEADER: &str = "x-user-id";
const USER_ROLES_HEADER: &str = "x-user-roles";

fn identity_from_parts(parts: &Parts) -> Result<Identity, AppError> {
    let user_id = parts
        .headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<i64>().ok())
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    let roles = parts
        .headers
        .get(USER_ROLES_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|role| !role.is_empty())
        .map(str::to_string);

    Ok(Identity::new(user_id, roles))
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let identity = identity_from_parts(parts);
        async move { identity }
    }
}

/// Every admin route starts here: the caller must hold the access role
/// (or be an administrator) before any per-group check happens.
pub fn require_admin_surface(identity: &Identity) -> AppResult<()> {
    if access::can_enter_admin(identity) {
        return Ok(());
    }
    Err(AppError::Forbidden(format!(
        "Your account has not been granted access yet. Required role: {}",
        access::ROLE_ACCESS
    )))
}
