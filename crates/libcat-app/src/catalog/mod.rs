pub mod author;
pub mod book;
pub mod genre;
pub mod instance;
pub mod paging;

pub use paging::{Page, Paging};

/// Generic list/detail/create/update/delete handlers for one entity.
/// Create and update answer with a redirect to the record's detail page,
/// delete redirects to the entity list (post/redirect/get).
#[macro_export]
macro_rules! crud_views {
    ($repository:ty, $payload_type:ty, $base_path:literal, $default_page_size:expr) => {
        $crate::repository_from_request!($repository);
        pub mod crud {
            use super::*;
            use $crate::catalog::{Page, Paging};
            use $crate::error::ApiResult;
            use axum::{
                Json,
                extract::{Path, Query},
                response::{IntoResponse, Redirect},
            };
            use axum_valid::Garde;
            use http::StatusCode;

            pub async fn create(
                repository: $repository,
                Garde(Json(payload)): Garde<Json<$payload_type>>,
            ) -> ApiResult<impl IntoResponse> {
                let record = repository.create(payload).await?;
                Ok(Redirect::to(&format!("{}/{}", $base_path, record.id)))
            }

            pub async fn list(
                repository: $repository,
                Garde(Query(paging)): Garde<Query<Paging>>,
            ) -> ApiResult<impl IntoResponse> {
                let page_size = paging.page_size($default_page_size);
                let params = paging.into_listing_params($default_page_size)?;
                let batch = repository.list(params).await?;
                Ok((StatusCode::OK, Json(Page::from_batch(batch, page_size))))
            }

            pub async fn get(
                Path(id): Path<i64>,
                repository: $repository,
            ) -> ApiResult<impl IntoResponse> {
                let record = repository.get(id).await?;
                Ok((StatusCode::OK, Json(record)))
            }

            pub async fn update(
                Path(id): Path<i64>,
                repository: $repository,
                Garde(Json(payload)): Garde<Json<$payload_type>>,
            ) -> ApiResult<impl IntoResponse> {
                let record = repository.update(id, payload).await?;
                Ok(Redirect::to(&format!("{}/{}", $base_path, record.id)))
            }

            pub async fn delete(
                Path(id): Path<i64>,
                repository: $repository,
            ) -> ApiResult<impl IntoResponse> {
                repository.delete(id).await?;
                Ok(Redirect::to($base_path))
            }
        }
    };
}
