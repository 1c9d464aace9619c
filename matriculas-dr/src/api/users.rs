//! Login and registration

use axum::{extract::State, http::StatusCode, Extension, Json};
use matriculas_common::users::{NewUser, User};
use matriculas_common::Role;
use serde::Deserialize;
use tracing::info;

use super::auth::{require_role, CurrentUser};
use super::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/login
///
/// Checks credentials and returns the user. Session handling belongs to the
/// caller, which forwards the email on later requests.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<User>, ApiError> {
    state
        .users
        .authenticate(&request.email, &request.password)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))
}

/// POST /api/users
///
/// Anyone may register a viewer; any higher role needs a root caller.
pub async fn register(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(new_user): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    if new_user.role > Role::Viewer {
        require_role(&state, &current, Role::Root)?;
    }

    let email = new_user.email.trim().to_lowercase();
    let role = new_user.role;

    if !state.users.add(new_user).await? {
        return Err(ApiError::Conflict(format!("Email already registered: {}", email)));
    }

    info!(email = %email, role = %role, "Registered user");
    Ok((StatusCode::CREATED, Json(User { email, role })))
}
