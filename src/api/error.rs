use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::assets::AssetError;
use crate::services::pipeline::PipelineError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Pipeline(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            AppError::Asset(AssetError::UnsupportedMediaType(_)) => StatusCode::BAD_REQUEST,
            AppError::Internal(_)
            | AppError::Pipeline(_)
            | AppError::Asset(AssetError::Io(_))
            | AppError::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Unauthorized(msg) | AppError::BadRequest(msg) | AppError::NotFound(msg) => {
                msg
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal Server Error".to_string()
            }
            AppError::Pipeline(e) => match e {
                PipelineError::UnsupportedMediaType(mt) => {
                    format!("Unsupported media type: {}", mt)
                }
                PipelineError::Io(_) => "Could not store upload".to_string(),
                PipelineError::Probe(_) | PipelineError::NoStreams => {
                    "Could not read video streams".to_string()
                }
                PipelineError::Remux(_) => "Could not process video for fast start".to_string(),
                PipelineError::Storage(_) => "Could not upload video".to_string(),
            },
            AppError::Asset(e) => match e {
                AssetError::UnsupportedMediaType(mt) => {
                    format!("Unsupported media type: {}", mt)
                }
                AssetError::Io(_) => "Could not store thumbnail".to_string(),
            },
            AppError::Anyhow(e) => {
                tracing::error!("Anyhow error: {:?}", e);
                "Internal Server Error".to_string()
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
