use crate::{auth::session::Admin, error::ApiResult, repository_from_request};
use axum_valid::Garde;
use libcat_dal::user::{CreateUser, UserRepository};

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, post},
};
use http::StatusCode;

use crate::state::AppState;

repository_from_request!(UserRepository);

pub async fn create_user(
    _admin: Admin,
    user_registry: UserRepository,
    Garde(Json(payload)): Garde<Json<CreateUser>>,
) -> ApiResult<impl IntoResponse> {
    let user = user_registry.create(payload).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

async fn list_users(
    _admin: Admin,
    State(state): State<AppState>,
    user_registry: UserRepository,
) -> ApiResult<impl IntoResponse> {
    let users = user_registry
        .list(state.config().default_page_size as usize)
        .await?;
    Ok((StatusCode::OK, Json(users)))
}

async fn get_user(
    _admin: Admin,
    Path(id): Path<i64>,
    user_registry: UserRepository,
) -> ApiResult<impl IntoResponse> {
    let user = user_registry.get(id).await?;
    Ok((StatusCode::OK, Json(user)))
}

async fn delete_user(
    _admin: Admin,
    Path(id): Path<i64>,
    user_registry: UserRepository,
) -> ApiResult<impl IntoResponse> {
    user_registry.delete(id).await?;

    Ok((StatusCode::NO_CONTENT, ()))
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", post(create_user).get(list_users))
        .route("/{id}", delete(delete_user).get(get_user))
}
