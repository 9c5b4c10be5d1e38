//! HTTP路由handlers

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;

use crate::http::{
    models::{ApiResponse, DownloadRequest, HttpServerError, TranscribeRequest},
    state::AppState,
};

/// 创建所有路由
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/download", post(download_handler))
        .route("/api/download/:id/cancel", post(cancel_handler))
        .route("/api/transcribe", post(transcribe_handler))
        .route("/api/transcribe/:id", get(transcribe_progress_handler))
        .route("/api/progress/:id", get(progress_handler))
        .route("/api/tasks", get(tasks_handler))
        .with_state(state)
}

/// GET /api/health - 健康检查
async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "mediaq",
        "started_at": state.started_at.to_rfc3339(),
        "timestamp": Local::now().to_rfc3339(),
    }))
}

/// POST /api/download - 启动下载任务
async fn download_handler(
    State(state): State<AppState>,
    Json(req): Json<DownloadRequest>,
) -> Result<Json<ApiResponse>, HttpServerError> {
    let ack = state
        .service
        .create_download(&req.url, req.output_dir.as_deref(), req.filename.as_deref())
        .await?;
    ApiResponse::ok(ack)
}

/// POST /api/download/{id}/cancel - 取消任务
async fn cancel_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse>, HttpServerError> {
    let record = state.service.cancel(&id).await?;
    ApiResponse::ok(record)
}

/// POST /api/transcribe - 启动转写任务
async fn transcribe_handler(
    State(state): State<AppState>,
    Json(req): Json<TranscribeRequest>,
) -> Result<Json<ApiResponse>, HttpServerError> {
    let ack = state
        .service
        .create_transcribe(
            &req.video_path,
            req.output_dir.as_deref(),
            req.output_filename.as_deref(),
            req.language.as_deref(),
        )
        .await?;
    ApiResponse::ok(ack)
}

/// GET /api/transcribe/{id} - 查询转写进度
async fn transcribe_progress_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse>, HttpServerError> {
    let record = state.service.get_progress(&id, Some("transcribe")).await?;
    ApiResponse::ok(record)
}

/// GET /api/progress/{id} - 查询任意任务进度
async fn progress_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse>, HttpServerError> {
    let record = state.service.get_progress(&id, None).await?;
    ApiResponse::ok(record)
}

/// GET /api/tasks - 列出全部任务
async fn tasks_handler(State(state): State<AppState>) -> Result<Json<ApiResponse>, HttpServerError> {
    ApiResponse::ok(state.service.list_tasks().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use mediaq_core::api::{AppConfig, TaskRegistry, TaskService};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn router() -> Router {
        let service = TaskService::new(TaskRegistry::new(), Arc::new(AppConfig::default()));
        create_router(AppState::new(service))
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let resp = router()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let v = body_json(resp).await;
        assert_eq!(v["status"], "ok");
        assert_eq!(v["service"], "mediaq");
    }

    #[tokio::test]
    async fn download_roundtrip_and_progress() {
        let app = router();
        let resp = app
            .clone()
            .oneshot(
                Request::post("/api/download")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"url":"https://example.com/watch?v=1","output_dir":"/tmp/dl"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let v = body_json(resp).await;
        assert_eq!(v["success"], true);
        let task_id = v["data"]["task_id"].as_str().unwrap().to_string();
        assert!(task_id.starts_with("dl-"));

        let resp = app
            .oneshot(
                Request::get(format!("/api/progress/{task_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let v = body_json(resp).await;
        assert_eq!(v["data"]["task_id"], task_id.as_str());
    }

    #[tokio::test]
    async fn empty_url_is_a_bad_request() {
        let resp = router()
            .oneshot(
                Request::post("/api/download")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"url":"  "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let v = body_json(resp).await;
        assert_eq!(v["success"], false);
        assert_eq!(v["error_code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn unknown_task_is_a_404() {
        let resp = router()
            .oneshot(
                Request::get("/api/progress/dl-nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn transcribe_progress_rejects_download_ids() {
        let service = TaskService::new(TaskRegistry::new(), Arc::new(AppConfig::default()));
        let rec = service
            .registry()
            .create(mediaq_core::api::TaskKind::Download, "u".into())
            .await;
        let app = create_router(AppState::new(service));

        let resp = app
            .oneshot(
                Request::get(format!("/api/transcribe/{}", rec.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cancel_then_list_shows_the_terminal_task() {
        let service = TaskService::new(TaskRegistry::new(), Arc::new(AppConfig::default()));
        let rec = service
            .registry()
            .create(mediaq_core::api::TaskKind::Download, "u".into())
            .await;
        let app = create_router(AppState::new(service));

        let resp = app
            .clone()
            .oneshot(
                Request::post(format!("/api/download/{}/cancel", rec.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let v = body_json(resp).await;
        assert_eq!(v["data"]["status"], "cancelled");

        let resp = app
            .oneshot(Request::get("/api/tasks").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let v = body_json(resp).await;
        assert_eq!(v["data"]["summary"]["failed"], 1);
        assert_eq!(v["data"]["downloads"][0]["task_id"], rec.id.as_str());
    }
}
