use libcat_dal::author::{AuthorRepository, CreateAuthor};

use crate::{crud_views, state::AppState};
use axum::routing::{get, post};

// Same small page as the original author list
const PAGE_SIZE: u32 = 2;

crud_views!(AuthorRepository, CreateAuthor, "/author", PAGE_SIZE);

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", get(crud::list))
        .route("/create", post(crud::create))
        .route("/{id}", get(crud::get))
        .route("/{id}/update", post(crud::update))
        .route("/{id}/delete", post(crud::delete))
}
