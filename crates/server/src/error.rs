use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::validation::ValidationError;
use deployment::DeploymentError;
use services::services::{
    auth::AuthError, invitations::InvitationError, tenancy::TenancyError,
};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Tenancy(#[from] TenancyError),
    #[error(transparent)]
    Invitation(#[from] InvitationError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Deployment(#[from] DeploymentError),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    /// Status code and client-facing message.
    fn parts(&self) -> (StatusCode, String) {
        match self {
            ApiError::Auth(e) => (StatusCode::UNAUTHORIZED, e.to_string()),
            ApiError::Tenancy(TenancyError::NoCompany) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::Tenancy(TenancyError::Forbidden) => (StatusCode::FORBIDDEN, self.to_string()),
            ApiError::Tenancy(TenancyError::Database(e)) => database_parts(e),
            ApiError::Invitation(e) => match e {
                InvitationError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, e.to_string()),
                InvitationError::NotFound => (StatusCode::NOT_FOUND, e.to_string()),
                InvitationError::Database(db) => database_parts(db),
                InvitationError::Validation(_)
                | InvitationError::NotPending(_)
                | InvitationError::Expired
                | InvitationError::EmailMismatch
                | InvitationError::AlreadyMember => (StatusCode::BAD_REQUEST, e.to_string()),
            },
            ApiError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Database(e) => database_parts(e),
            ApiError::Deployment(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
        }
    }
}

fn database_parts(e: &sqlx::Error) -> (StatusCode, String) {
    match e {
        sqlx::Error::RowNotFound => (StatusCode::NOT_FOUND, "Record not found".to_string()),
        sqlx::Error::Database(db) if db.is_unique_violation() => (
            StatusCode::BAD_REQUEST,
            "A record with these details already exists".to_string(),
        ),
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => (
            StatusCode::BAD_REQUEST,
            "Referenced record does not exist or is still in use".to_string(),
        ),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }
        (status, Json(ApiResponse::<()>::error(&message))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (ApiError::from(AuthError::Expired), StatusCode::UNAUTHORIZED),
            (ApiError::from(TenancyError::NoCompany), StatusCode::BAD_REQUEST),
            (ApiError::from(TenancyError::Forbidden), StatusCode::FORBIDDEN),
            (
                ApiError::from(InvitationError::RateLimited),
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (ApiError::from(InvitationError::Expired), StatusCode::BAD_REQUEST),
            (
                ApiError::from(ValidationError::new("name is required")),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::NotFound("Property"), StatusCode::NOT_FOUND),
            (ApiError::from(sqlx::Error::RowNotFound), StatusCode::NOT_FOUND),
            (
                ApiError::from(sqlx::Error::PoolTimedOut),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn not_found_message_names_the_resource() {
        let (_, message) = ApiError::NotFound("Property").parts();
        assert_eq!(message, "Property not found");
    }
}
