use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde_json::json;
use tracing::{debug, error};

pub type ApiResult<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] cookbook_dal::Error),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidQuery(_) | ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::DatabaseError(e) => match e {
                cookbook_dal::Error::RecordNotFound(_) => StatusCode::NOT_FOUND,
                cookbook_dal::Error::DuplicateRecord(_)
                | cookbook_dal::Error::ReferencedRecord(_) => StatusCode::CONFLICT,
                cookbook_dal::Error::InvalidReference(_) | cookbook_dal::Error::InvalidValue(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                cookbook_dal::Error::InvalidOrderByField(_) => StatusCode::BAD_REQUEST,
                cookbook_dal::Error::InvalidCredentials => StatusCode::FORBIDDEN,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {self}");
            // internal details are not exposed to clients
            return (status, Json(json!({"error": "Internal server error"}))).into_response();
        }
        debug!("Request failed with status {status}: {self}");
        let message = match self {
            ApiError::DatabaseError(e) => e.to_string(),
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (
                ApiError::DatabaseError(cookbook_dal::Error::RecordNotFound("Recipe".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::DatabaseError(cookbook_dal::Error::ReferencedRecord("Tag".into())),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::DatabaseError(cookbook_dal::Error::DuplicateRecord("User".into())),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::DatabaseError(cookbook_dal::Error::InvalidOrderByField("x".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Forbidden("You cannot edit this recipe".into()),
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::DatabaseError(cookbook_dal::Error::InvalidReference("User".into())),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::DatabaseError(cookbook_dal::Error::InvalidValue("empty title".into())),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
