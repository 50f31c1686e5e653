use libcat_dal::genre::{CreateGenre, GenreRepository};

use crate::{crud_views, state::AppState};
use axum::routing::{get, post};

const PAGE_SIZE: u32 = 100;

crud_views!(GenreRepository, CreateGenre, "/genre", PAGE_SIZE);

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", get(crud::list))
        .route("/create", post(crud::create))
        .route("/{id}", get(crud::get))
        .route("/{id}/update", post(crud::update))
        .route("/{id}/delete", post(crud::delete))
}
