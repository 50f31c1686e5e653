use axum::{
    Form, Json,
    extract::{FromRequest as _, Path, Query},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_valid::Garde;
use garde::Validate;
use http::StatusCode;
use libcat_dal::instance::{BookInstance, BookInstanceRepository};
use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{
    auth::session::{Librarian, SessionUser},
    catalog::{Page, Paging},
    error::{ApiError, ApiResult},
    repository_from_request,
    state::AppState,
};
use libcat_types::claim::{Authorization as _, Role};

const PAGE_SIZE: u32 = 10;
const LOAN_WEEKS: i64 = 3;
const MAX_RENEWAL_WEEKS: i64 = 4;

repository_from_request!(BookInstanceRepository);

fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

fn proposed_due_back() -> Date {
    today() + Duration::weeks(LOAN_WEEKS)
}

fn within_renewal_window(value: &Date, _ctx: &()) -> garde::Result {
    if *value < today() {
        return Err(garde::Error::new("renewal date is in the past"));
    }
    if *value > today() + Duration::weeks(MAX_RENEWAL_WEEKS) {
        return Err(garde::Error::new(
            "renewal date is more than 4 weeks ahead",
        ));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct RenewalForm {
    #[garde(custom(within_renewal_window))]
    pub renewal_date: Date,
}

/// Context of the renewal page: the copy and the (proposed or re-displayed)
/// form, with validation messages when the submission was rejected.
#[derive(Debug, Serialize, Deserialize)]
pub struct RenewalContext {
    pub book_instance: BookInstance,
    pub form: RenewalForm,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Copies on loan to the current session user, soonest due first.
pub async fn my_borrowed(
    SessionUser(user): SessionUser,
    repository: BookInstanceRepository,
    Garde(Query(paging)): Garde<Query<Paging>>,
) -> ApiResult<impl IntoResponse> {
    let page_size = paging.page_size(PAGE_SIZE);
    let params = paging.into_listing_params(PAGE_SIZE)?;
    let batch = repository.list_borrowed(user.id, params).await?;
    Ok((StatusCode::OK, Json(Page::from_batch(batch, page_size))))
}

/// Same listing for the borrowed-books screen; requires the librarian
/// role on top of authentication. Anonymous users are redirected to login
/// by the SessionUser extractor, authenticated ones without the role get
/// 403 - never the data.
pub async fn all_borrowed(
    SessionUser(user): SessionUser,
    repository: BookInstanceRepository,
    Garde(Query(paging)): Garde<Query<Paging>>,
) -> ApiResult<impl IntoResponse> {
    if !user.has_role(Role::librarian()) {
        debug!("User {} lacks role librarian", user.email);
        return Err(ApiError::Forbidden(Role::librarian().to_string()));
    }
    let page_size = paging.page_size(PAGE_SIZE);
    let params = paging.into_listing_params(PAGE_SIZE)?;
    let batch = repository.list_borrowed(user.id, params).await?;
    Ok((StatusCode::OK, Json(Page::from_batch(batch, page_size))))
}

/// Renewal form with the default proposed date (today + 3 weeks).
pub async fn renew_form(
    _librarian: Librarian,
    Path(id): Path<Uuid>,
    repository: BookInstanceRepository,
) -> ApiResult<impl IntoResponse> {
    let book_instance = repository.get(id).await?;
    Ok((
        StatusCode::OK,
        Json(RenewalContext {
            book_instance,
            form: RenewalForm {
                renewal_date: proposed_due_back(),
            },
            errors: Vec::new(),
        }),
    ))
}

/// Renewal submission: valid date overwrites the due-back date and
/// redirects to the borrowed-books listing; invalid date re-displays the
/// bound form with messages and no mutation.
pub async fn renew(
    _librarian: Librarian,
    Path(id): Path<Uuid>,
    repository: BookInstanceRepository,
    request: axum::extract::Request,
) -> ApiResult<Response> {
    let book_instance = repository.get(id).await?;

    // media type only, parameters like charset do not matter here
    let media_type = request
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim())
        .ok_or_else(|| ApiError::BadRequest("Missing content type".to_string()))?;
    let form = if media_type == "application/json" {
        let Json(form) = Json::<RenewalForm>::from_request(request, &())
            .await
            .map_err(|e| {
                debug!("Failed to read renewal form: {e}");
                ApiError::BadRequest("Malformed renewal form".to_string())
            })?;
        form
    } else if media_type == "application/x-www-form-urlencoded" {
        let Form(form) = Form::<RenewalForm>::from_request(request, &())
            .await
            .map_err(|e| {
                debug!("Failed to read renewal form: {e}");
                ApiError::BadRequest("Malformed renewal form".to_string())
            })?;
        form
    } else {
        return Err(ApiError::BadRequest("Unsupported content type".to_string()));
    };

    if let Err(report) = form.validate() {
        let errors = report
            .iter()
            .map(|(path, error)| format!("{path}: {error}"))
            .collect();
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(RenewalContext {
                book_instance,
                form,
                errors,
            }),
        )
            .into_response());
    }

    repository.renew(id, form.renewal_date).await?;
    Ok(Redirect::to("/borrowed_books").into_response())
}

/// Borrows an available copy for the current user for the standard loan
/// period.
pub async fn borrow(
    SessionUser(user): SessionUser,
    Path(id): Path<Uuid>,
    repository: BookInstanceRepository,
) -> ApiResult<impl IntoResponse> {
    repository.borrow(id, user.id, proposed_due_back()).await?;
    Ok(Redirect::to("/mybooks"))
}

/// Marks a loaned copy as returned; the librarian capability is exactly
/// the right to do this.
pub async fn mark_returned(
    _librarian: Librarian,
    Path(id): Path<Uuid>,
    repository: BookInstanceRepository,
) -> ApiResult<impl IntoResponse> {
    repository.mark_returned(id).await?;
    Ok(Redirect::to("/borrowed_books"))
}

/// Routes operating on one copy - must be nested on /book path!
pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/{id}/renew", get(renew_form).post(renew))
        .route("/{id}/borrow", post(borrow))
        .route("/{id}/return", post(mark_returned))
}
