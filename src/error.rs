use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::services::ServiceError;
use crate::store::StoreError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorObject,
}

#[derive(Debug, Serialize)]
pub struct ErrorObject {
    pub code: String,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(&'static str, String),
    Forbidden(&'static str, String),
    BadRequest(&'static str, String),
    NotFound(&'static str, String),
    Conflict(&'static str, String),
    Internal(String),
}

const INTERNAL_MESSAGE: &str = "Something went wrong, please try again later";

impl ApiError {
    pub fn invalid_credentials() -> Self {
        ApiError::Unauthorized("INVALID_CREDENTIALS", "Username or password is incorrect".into())
    }

    pub fn session_expired() -> Self {
        ApiError::Unauthorized("SESSION_EXPIRED", "Session expired".into())
    }

    pub fn db(e: sqlx::Error) -> Self {
        ApiError::Internal(format!("db error: {e}"))
    }

    fn to_error_response(code: &str, message: &str) -> Json<ErrorResponse> {
        Json(ErrorResponse {
            error: ErrorObject {
                code: code.to_string(),
                message: message.to_string(),
            },
        })
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        let message = e.to_string();
        match e {
            ServiceError::NotFound(_) => ApiError::NotFound("NOT_FOUND", message),
            ServiceError::Forbidden(_) => ApiError::Forbidden("FORBIDDEN", message),
            ServiceError::InvalidState(_) => ApiError::Conflict("INVALID_STATE", message),
            ServiceError::Validation { code, .. } => ApiError::BadRequest(code, message),
            ServiceError::Conflict(_) => ApiError::Conflict("CONFLICT", message),
            ServiceError::Store(
                StoreError::StaleRevision { .. } | StoreError::Duplicate { .. },
            ) => ApiError::Conflict(
                "CONFLICT",
                "The schedule changed while saving, please retry".into(),
            ),
            ServiceError::Store(inner) => ApiError::Internal(inner.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(code, msg) => {
                (StatusCode::UNAUTHORIZED, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::Forbidden(code, msg) => {
                (StatusCode::FORBIDDEN, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::BadRequest(code, msg) => {
                (StatusCode::BAD_REQUEST, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::NotFound(code, msg) => {
                (StatusCode::NOT_FOUND, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::Conflict(code, msg) => {
                (StatusCode::CONFLICT, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::Internal(msg) => {
                // details stay in the log
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::to_error_response("INTERNAL", INTERNAL_MESSAGE),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn status_of(e: ServiceError) -> StatusCode {
        ApiError::from(e).into_response().status()
    }

    #[test]
    fn test_service_error_mapping() {
        assert_eq!(status_of(ServiceError::NotFound("appointment")), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(ServiceError::Forbidden("not yours".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(ServiceError::InvalidState("nope".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ServiceError::Validation {
                code: "OUTSIDE_WORKING_HOURS",
                message: "x".into()
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ServiceError::Store(StoreError::StaleRevision {
                collection: "availability".into(),
                id: Uuid::nil(),
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ServiceError::Store(StoreError::Aborted("boom".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_code_is_kept() {
        match ApiError::from(ServiceError::Validation {
            code: "NOT_A_WORKING_DAY",
            message: "2024-03-20 is not a working day".into(),
        }) {
            ApiError::BadRequest(code, msg) => {
                assert_eq!(code, "NOT_A_WORKING_DAY");
                assert!(msg.contains("not a working day"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
