//! Caller identity and role checks
//!
//! Sessions are owned by an upstream collaborator, which forwards the signed-in
//! email in the `x-user-email` header. The middleware resolves it through the
//! user repository; a missing or unknown email is "no user", which carries the
//! viewer role.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use matriculas_common::users::User;
use matriculas_common::Role;
use tracing::{debug, warn};

use super::ApiError;
use crate::AppState;

/// Header carrying the signed-in user's email
pub const USER_HEADER: &str = "x-user-email";

/// Resolved caller, inserted as a request extension
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<User>);

impl CurrentUser {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }

    /// Effective role; no user is a viewer
    pub fn role(&self) -> Role {
        self.0.as_ref().map(|u| u.role).unwrap_or_default()
    }
}

/// Identity middleware
///
/// Never rejects a request on its own; handlers decide with [`require_role`].
///
/// The header is trusted as-is, so a client that reaches the service directly
/// can claim any account, root included. The service must only be reachable
/// through the session proxy that sets the header; keep `bind` on loopback or
/// a private interface.
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let email = request
        .headers()
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let user = match email {
        Some(email) => {
            let user = state.users.find(&email).await?;
            if user.is_none() {
                debug!(email = %email, "Unknown user, treating as anonymous");
            }
            user
        }
        None => None,
    };

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// Reject the request unless the caller's role reaches `required`
pub fn require_role(state: &AppState, current: &CurrentUser, required: Role) -> Result<(), ApiError> {
    if state.gateway.has_permission(current.user(), required) {
        return Ok(());
    }

    warn!(
        email = current.user().map(|u| u.email.as_str()).unwrap_or("-"),
        role = %current.role(),
        required = %required,
        "Permission denied"
    );
    Err(ApiError::Forbidden(required))
}
