//! HTTP API数据模型

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mediaq_core::api::TaskError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TranscribeRequest {
    pub video_path: String,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub output_filename: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

/// 统一响应包装
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl ApiResponse {
    pub fn ok<T: Serialize>(data: T) -> Result<Json<Self>, HttpServerError> {
        let data = serde_json::to_value(data)
            .map_err(|e| HttpServerError::Internal(e.to_string()))?;
        Ok(Json(Self {
            success: true,
            data: Some(data),
            error: None,
            error_code: None,
        }))
    }
}

#[derive(Debug)]
pub enum HttpServerError {
    InvalidRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<TaskError> for HttpServerError {
    fn from(e: TaskError) -> Self {
        match e {
            TaskError::Validation(_) | TaskError::UnknownKind(_) => {
                Self::InvalidRequest(e.to_string())
            }
            TaskError::NotFound(_) => Self::NotFound(e.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            Self::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
        };

        let body = serde_json::json!({
            "success": false,
            "error": message,
            "error_code": error_code,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn download_request_fills_optional_fields() {
        let req: DownloadRequest =
            serde_json::from_str(r#"{"url":"https://example.com/v"}"#).unwrap();
        assert_eq!(req.url, "https://example.com/v");
        assert!(req.output_dir.is_none());
        assert!(req.filename.is_none());
    }

    #[test]
    fn task_errors_map_to_http_statuses() {
        let e: HttpServerError = TaskError::Validation("bad".into()).into();
        assert!(matches!(e, HttpServerError::InvalidRequest(_)));
        let e: HttpServerError = TaskError::NotFound("dl-x".into()).into();
        assert!(matches!(e, HttpServerError::NotFound(_)));
        let e: HttpServerError = TaskError::Runtime("boom".into()).into();
        assert!(matches!(e, HttpServerError::Internal(_)));
    }
}
