use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use crate::auth::session::AuthError;
use crate::store::StoreError;
use crate::validation::ValidationErrors;

/// Transport-level error. Everything a handler can fail with ends up here.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Unprocessable(ValidationErrors),
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NoRecords | StoreError::InvalidId | StoreError::NotFound => {
                ApiError::NotFound(e.to_string())
            }
            StoreError::Validation(fields) => {
                warn!(%fields, "validation failed");
                ApiError::Unprocessable(fields)
            }
            // already logged where it was produced
            StoreError::Internal(_) => ApiError::Internal,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::AuthFailed | AuthError::NotAuthenticated => {
                ApiError::Unauthorized(e.to_string())
            }
            AuthError::Store(inner) => inner.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::BadRequest(msg) | ApiError::Unauthorized(msg) | ApiError::NotFound(msg) => {
                json!({ "error": msg })
            }
            ApiError::Unprocessable(fields) => json!({
                "error": format!("validation failed: {}", fields),
                "fields": fields,
            }),
            ApiError::Internal => json!({ "error": "internal server error" }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_status() {
        assert_eq!(ApiError::from(StoreError::NoRecords).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::from(StoreError::InvalidId).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::from(StoreError::NotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(StoreError::Validation(ValidationErrors::single("name", "x"))).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(StoreError::Internal(anyhow::anyhow!("boom"))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn auth_errors_map_to_unauthorized() {
        assert_eq!(ApiError::from(AuthError::AuthFailed).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::from(AuthError::NotAuthenticated).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::Store(StoreError::Internal(anyhow::anyhow!("db")))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
