use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::AppError;

pub type ApiResult<T> = Result<JsonApiResponse<T>, AppError>;

/// Wire shape shared by every API response: `{error, message?, ...payload}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub payload: T,
}

#[derive(Debug, Serialize)]
pub struct ModelBody<T: Serialize> {
    pub model: T,
}

#[derive(Debug, Serialize)]
pub struct ModelsBody<T: Serialize> {
    pub models: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub has_next: bool,
}

#[derive(Debug, Default, Serialize)]
pub struct NoPayload {}

#[derive(Debug)]
pub struct JsonApiResponse<T: Serialize> {
    pub status: StatusCode,
    pub body: Envelope<T>,
}

impl<T: Serialize> JsonApiResponse<T> {
    pub fn ok(payload: T) -> ApiResult<T> {
        Self::with_status(StatusCode::OK, payload)
    }

    pub fn with_status(status: StatusCode, payload: T) -> ApiResult<T> {
        Ok(Self {
            status,
            body: Envelope {
                error: false,
                message: None,
                payload,
            },
        })
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.body.message = Some(message.into());
        self
    }
}

impl<T: Serialize> JsonApiResponse<ModelBody<T>> {
    pub fn model(model: T) -> ApiResult<ModelBody<T>> {
        Self::ok(ModelBody { model })
    }
}

impl JsonApiResponse<NoPayload> {
    pub fn message(message: impl Into<String>) -> ApiResult<NoPayload> {
        Self::ok(NoPayload {}).map(|response| response.with_message(message))
    }

    pub(crate) fn from_error(err: &AppError) -> Self {
        Self {
            status: err.status(),
            body: Envelope {
                error: true,
                message: Some(err.message().to_string()),
                payload: NoPayload {},
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log_app_error(&self, status);
        }
        JsonApiResponse::from_error(&self).into_response()
    }
}

impl<T: Serialize> IntoResponse for JsonApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub(crate) fn log_app_error(err: &AppError, status: StatusCode) {
    tracing::error!(status = status.as_u16(), error = %err, "request failed");
}
