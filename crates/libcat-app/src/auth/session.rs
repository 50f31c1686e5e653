use axum::{
    RequestPartsExt as _,
    extract::FromRequestParts,
    response::{IntoResponse, Redirect, Response},
};
use http::request::Parts;
use libcat_dal::user::User;
use libcat_types::claim::{Authorization as _, Role};
use tower_sessions::Session;
use tracing::{debug, error};

use crate::{auth::{LOGIN_PATH, SESSION_USER_KEY}, error::ApiError, state::AppState};

async fn session_user(parts: &mut Parts) -> Result<Option<User>, ApiError> {
    let session = parts.extract::<Session>().await.map_err(|e| {
        error!("Missing session layer: {}", e.1);
        ApiError::BadRequest("Session not available".to_string())
    })?;
    let user = session
        .get::<User>(SESSION_USER_KEY)
        .await
        .inspect_err(|e| error!("Failed to read user from session: {e}"))?;
    Ok(user)
}

/// Authenticated session user; anonymous requests are redirected to the
/// login page (behavior of the original list views).
pub struct SessionUser(pub User);

pub struct LoginRedirect;

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        Redirect::to(LOGIN_PATH).into_response()
    }
}

impl FromRequestParts<AppState> for SessionUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match session_user(parts).await {
            Ok(Some(user)) => Ok(SessionUser(user)),
            Ok(None) => {
                debug!("Anonymous access, redirecting to login");
                Err(LoginRedirect.into_response())
            }
            Err(e) => Err(e.into_response()),
        }
    }
}

/// Session user holding given role; refuses with explicit 401/403 before
/// the handler body runs.
async fn user_with_role(parts: &mut Parts, role: Role) -> Result<User, ApiError> {
    let user = session_user(parts)
        .await?
        .ok_or(ApiError::Unauthenticated)?;
    if user.has_role(&role) {
        Ok(user)
    } else {
        debug!("User {} lacks role {}", user.email, role);
        Err(ApiError::Forbidden(role.to_string()))
    }
}

pub struct Librarian(pub User);

impl FromRequestParts<AppState> for Librarian {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        user_with_role(parts, Role::librarian()).await.map(Librarian)
    }
}

pub struct Admin(pub User);

impl FromRequestParts<AppState> for Admin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        user_with_role(parts, Role::admin()).await.map(Admin)
    }
}
