use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};
use axum::{
    Form, Json,
    extract::{FromRequest as _, State},
    response::{IntoResponse, Redirect},
    routing::get,
};
use http::StatusCode;
use libcat_dal::user::{User, UserRepository};
use tower_sessions::Session;
use tracing::{debug, error, warn};

pub mod session;

pub const SESSION_USER_KEY: &str = "user";
pub const LOGIN_PATH: &str = "/auth/login";

#[derive(serde::Deserialize)]
struct LoginCredentials {
    email: String,
    password: String,
}

async fn login_page() -> impl IntoResponse {
    (
        StatusCode::OK,
        "Sign in by posting email and password to /auth/login",
    )
}

pub async fn after_ok_login(
    session: &Session,
    known_user: User,
) -> ApiResult<impl IntoResponse> {
    session
        .insert(SESSION_USER_KEY, known_user)
        .await
        .inspect_err(|e| error!("Failed to store user in session: {e}"))?;

    Ok(Redirect::to("/"))
}

pub async fn login(
    _state: State<AppState>,
    user_registry: UserRepository,
    session: Session,
    request: axum::extract::Request,
) -> ApiResult<impl IntoResponse> {
    // media type only, parameters like charset do not matter here
    let media_type = request
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim())
        .ok_or_else(|| ApiError::BadRequest("Missing content type".to_string()))?;
    let credentials = if media_type == "application/json" {
        let Json(data) = Json::<LoginCredentials>::from_request(request, &())
            .await
            .map_err(|e| {
                debug!("Failed to get login credentials: {e}");
                ApiError::BadRequest("Malformed credentials".to_string())
            })?;
        data
    } else if media_type == "application/x-www-form-urlencoded" {
        let Form(data) = Form::<LoginCredentials>::from_request(request, &())
            .await
            .map_err(|e| {
                debug!("Failed to get login credentials: {e}");
                ApiError::BadRequest("Malformed credentials".to_string())
            })?;
        data
    } else {
        return Err(ApiError::BadRequest("Unsupported content type".to_string()));
    };

    let user = user_registry
        .check_password(&credentials.email, &credentials.password)
        .await
        .inspect_err(|e| debug!("User check error: {e}"))?;

    after_ok_login(&session, user).await
}

pub async fn me(session: Session) -> ApiResult<Json<User>> {
    let user = session
        .get::<User>(SESSION_USER_KEY)
        .await
        .inspect_err(|e| error!("Failed to get user from session: {e}"))?
        .ok_or(ApiError::Unauthenticated)?;
    Ok(Json(user))
}

pub async fn logout(session: Session) -> ApiResult<impl IntoResponse> {
    session
        .delete()
        .await
        .unwrap_or_else(|e| warn!("Failed to delete session: {e}"));

    Ok(Redirect::to("/"))
}

/// Builds authentication router - must be nested on /auth path!
pub fn auth_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
        .route("/me", get(me))
}
