use axum::{
    Json,
    response::{IntoResponse, Response},
};
use http::StatusCode;
use serde::Serialize;
use tracing::error;

pub type Error = anyhow::Error;
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub type ApiResult<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Login required")]
    Unauthenticated,

    #[error("Missing permission: {0}")]
    Forbidden(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Validation failed")]
    Validation(#[from] garde::Report),

    #[error(transparent)]
    Dal(#[from] libcat_dal::Error),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        use libcat_dal::Error as DalError;
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) | ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Dal(e) => match e {
                DalError::RecordNotFound(_) => StatusCode::NOT_FOUND,
                DalError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                DalError::InvalidOrderByField(_) => StatusCode::BAD_REQUEST,
                DalError::NotAvailable | DalError::NotOnLoan => StatusCode::CONFLICT,
                DalError::DatabaseError(_) | DalError::UserPasswordError(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Internal error: {self}");
        }
        let (message, fields) = match &self {
            // do not leak database details to clients
            ApiError::Dal(libcat_dal::Error::DatabaseError(_))
            | ApiError::Dal(libcat_dal::Error::UserPasswordError(_))
            | ApiError::Session(_) => ("Internal server error".to_string(), Vec::new()),
            ApiError::Validation(report) => (
                "Validation failed".to_string(),
                report
                    .iter()
                    .map(|(path, error)| format!("{path}: {error}"))
                    .collect(),
            ),
            other => (other.to_string(), Vec::new()),
        };
        let body = ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("unknown")
                .to_string(),
            message,
            fields,
        };
        (status, Json(body)).into_response()
    }
}
