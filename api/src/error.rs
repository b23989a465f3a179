use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failures of store operations; the payloads identify the rejected email.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Email already captured")]
    Duplicate(String),

    #[error("Email not found")]
    NotFound(i64),

    #[error("{0}")]
    Validation(String),

    #[error("database error: {0}")]
    Internal(#[from] sqlx::Error),
}

impl StoreError {
    pub fn status(&self) -> StatusCode {
        match self {
            StoreError::Duplicate(_) => StatusCode::BAD_REQUEST,
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            StoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            StoreError::Internal(e) => {
                tracing::error!(error = %e, "Database operation failed");
                "Internal Server Error".to_string()
            }
            StoreError::Duplicate(message_id) => {
                tracing::debug!(%message_id, "Rejecting duplicate capture");
                self.to_string()
            }
            StoreError::NotFound(id) => {
                tracing::debug!(id, "No email with this id");
                self.to_string()
            }
            StoreError::Validation(_) => self.to_string(),
        };

        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            StoreError::Duplicate("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(StoreError::NotFound(1).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            StoreError::Validation("bad".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            StoreError::Internal(sqlx::Error::PoolClosed).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_internal_error_is_not_echoed() {
        let response = StoreError::Internal(sqlx::Error::PoolClosed).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["detail"], "Internal Server Error");
    }
}
