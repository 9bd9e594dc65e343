use axum::http::StatusCode;
use thiserror::Error;

use crate::db::dao::DaoLayerError;

/// Request-level failure. The variant picks the HTTP status, the message is
/// what the client sees in the `{error: true, message}` envelope.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Maps a bare status (from a rejection or fallback) onto the closest variant.
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized(message),
            StatusCode::FORBIDDEN => Self::Forbidden(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::CONFLICT => Self::Conflict(message),
            status if status.is_client_error() => Self::BadRequest(message),
            _ => Self::Internal(message),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(message)
            | Self::Unauthorized(message)
            | Self::Forbidden(message)
            | Self::NotFound(message)
            | Self::Conflict(message)
            | Self::Internal(message) => message,
        }
    }
}

impl From<DaoLayerError> for AppError {
    fn from(err: DaoLayerError) -> Self {
        match err {
            DaoLayerError::NotFound { .. } => Self::not_found(err.to_string()),
            DaoLayerError::InvalidPagination { .. } | DaoLayerError::InvalidValue { .. } => {
                Self::bad_request(err.to_string())
            }
            DaoLayerError::Db(_) | DaoLayerError::Decode(_) => Self::internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::AppError;
    use crate::db::dao::DaoLayerError;

    #[test]
    fn unmapped_statuses_fall_back_by_class() {
        let teapot = AppError::from_status(StatusCode::IM_A_TEAPOT, "teapot");
        let gateway = AppError::from_status(StatusCode::BAD_GATEWAY, "upstream");

        assert_eq!(teapot.status(), StatusCode::BAD_REQUEST);
        assert_eq!(gateway.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(gateway.to_string(), "upstream");
    }

    #[test]
    fn dao_not_found_keeps_its_message() {
        let err = AppError::from(DaoLayerError::NotFound {
            entity: "equipment",
            id: "e1".to_string(),
        });

        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(err.message().contains("e1"));
    }
}
