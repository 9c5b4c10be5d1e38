//! HTTP服务器状态管理

use chrono::{DateTime, Local};
use mediaq_core::api::TaskService;

/// 应用状态（在所有handlers间共享）
#[derive(Clone)]
pub struct AppState {
    pub service: TaskService,
    pub started_at: DateTime<Local>,
}

impl AppState {
    pub fn new(service: TaskService) -> Self {
        Self {
            service,
            started_at: Local::now(),
        }
    }
}
