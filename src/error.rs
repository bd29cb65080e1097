use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Failures surfaced to clients. Variants map onto the response contract:
/// some carry a real HTTP status, others ride a 200 with `success: false`
/// in the body. That split is part of the API as clients observe it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input on endpoints that reject with 400.
    #[error("{0}")]
    Validation(String),
    /// Email already registered.
    #[error("{0}")]
    Conflict(String),
    /// Login failures: unknown email or wrong password.
    #[error("{0}")]
    Credentials(String),
    /// Missing, malformed, or failed bearer token.
    #[error("{0}")]
    Auth(String),
    /// Referenced user does not exist.
    #[error("{0}")]
    NotFound(String),
    /// Missing input on endpoints that report failure in the body only.
    #[error("{0}")]
    Incomplete(String),
    /// Store or crypto failure nothing above anticipated.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
struct FailBody {
    success: bool,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) | ApiError::Conflict(_) | ApiError::Credentials(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Auth(_) | ApiError::NotFound(_) | ApiError::Incomplete(_) => StatusCode::OK,
            ApiError::Unexpected(e) => {
                error!(error = %e, "unexpected failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = FailBody {
            success: false,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_and_conflict_are_bad_request() {
        let res = ApiError::Validation("Enter all details".into()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let res = ApiError::Conflict("Email already exists".into()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let res =
            ApiError::Credentials("Incorrect password, please try again".into()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn soft_failures_keep_default_status() {
        let res = ApiError::NotFound("No such user exists".into()).into_response();
        assert_eq!(res.status(), StatusCode::OK);
        let res = ApiError::Auth("No token provided".into()).into_response();
        assert_eq!(res.status(), StatusCode::OK);
        let res = ApiError::Incomplete("Password is required".into()).into_response();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[test]
    fn unexpected_is_internal_error() {
        let res = ApiError::from(anyhow::anyhow!("boom")).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
