use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{error::ApiResult, state::AppState};
use libcat_dal::{
    author::AuthorRepository, book::BookRepository, instance::BookInstanceRepository,
};

const VISITS_KEY: &str = "num_visits";

/// Context of the home page: collection counts plus the number of previous
/// visits in this session.
#[derive(Debug, Serialize, Deserialize)]
pub struct Summary {
    pub num_visits: u32,
    pub num_books: u64,
    pub num_instances: u64,
    pub num_instances_available: u64,
    pub num_authors: u64,
}

pub async fn index(session: Session, State(state): State<AppState>) -> ApiResult<Json<Summary>> {
    // Reports the pre-increment value, as the original does: the first
    // visit shows 0.
    let num_visits: u32 = session.get(VISITS_KEY).await?.unwrap_or(0);
    session.insert(VISITS_KEY, num_visits + 1).await?;

    let books = BookRepository::new(state.pool().clone());
    let instances = BookInstanceRepository::new(state.pool().clone());
    let authors = AuthorRepository::new(state.pool().clone());

    let num_books = books.count().await?;
    let num_instances = instances.count().await?;
    let num_instances_available = instances.count_available().await?;
    let num_authors = authors.count().await?;

    Ok(Json(Summary {
        num_visits,
        num_books,
        num_instances,
        num_instances_available,
        num_authors,
    }))
}
