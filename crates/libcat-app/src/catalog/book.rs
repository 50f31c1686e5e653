use libcat_dal::book::{BookRepository, CreateBook};

use crate::{crud_views, state::AppState};
use axum::routing::{get, post};

const PAGE_SIZE: u32 = 2;

crud_views!(BookRepository, CreateBook, "/books", PAGE_SIZE);

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", get(crud::list))
        .route("/create", post(crud::create))
        .route("/{id}", get(crud::get))
        .route("/{id}/update", post(crud::update))
        .route("/{id}/delete", post(crud::delete))
}
