//! API error types with HTTP response mapping.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::UseCaseError;
use serde::Serialize;
use store::RepositoryError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// A use case failed.
    UseCase(UseCaseError),
}

/// Error body returned to clients.
///
/// `cause` is only set for server-side failures and carries the underlying error.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, cause) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::UseCase(err) => use_case_error_to_response(err),
        };

        if status.is_server_error() {
            tracing::error!(%status, %message, cause = ?cause, "request failed");
        }

        (status, axum::Json(ErrorBody { message, cause })).into_response()
    }
}

fn use_case_error_to_response(err: UseCaseError) -> (StatusCode, String, Option<String>) {
    match err {
        UseCaseError::Domain(e) if e.is_validation() => {
            (StatusCode::BAD_REQUEST, e.to_string(), None)
        }
        UseCaseError::Domain(e) => (StatusCode::CONFLICT, e.to_string(), None),
        UseCaseError::Repository(e @ RepositoryError::NotFound { .. }) => {
            (StatusCode::NOT_FOUND, e.to_string(), None)
        }
        UseCaseError::Repository(e @ RepositoryError::AlreadyExists { .. }) => {
            (StatusCode::CONFLICT, e.to_string(), None)
        }
        UseCaseError::Repository(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Order storage failed".to_string(),
            Some(e.to_string()),
        ),
        UseCaseError::Search(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Order search failed".to_string(),
            Some(e.to_string()),
        ),
    }
}

impl From<UseCaseError> for ApiError {
    fn from(err: UseCaseError) -> Self {
        ApiError::UseCase(err)
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

#[cfg(test)]
mod tests {
    use domain::OrderError;
    use store::CacheError;

    use super::*;

    fn status_of(err: UseCaseError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_validation_errors_are_bad_requests() {
        assert_eq!(
            status_of(OrderError::NoItems.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(OrderError::CustomerIdRequired.into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_rule_violations_are_conflicts() {
        let err = OrderError::NotShippable {
            status: domain::OrderStatus::Pending,
        };
        assert_eq!(status_of(err.into()), StatusCode::CONFLICT);
    }

    #[test]
    fn test_missing_order_is_not_found() {
        let err = RepositoryError::not_found("Order", "OR404");
        assert_eq!(status_of(err.into()), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_infrastructure_errors_carry_cause() {
        let (status, message, cause) =
            use_case_error_to_response(CacheError::UnknownIndex("idx:orders".into()).into());

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Order search failed");
        assert_eq!(cause.as_deref(), Some("Unknown search index: idx:orders"));
    }

    #[test]
    fn test_client_errors_omit_cause() {
        let body = serde_json::to_value(ErrorBody {
            message: "bad".into(),
            cause: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "message": "bad" }));
    }
}
