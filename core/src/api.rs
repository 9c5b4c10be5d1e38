//! Stable re-exports for consumers (`cli` and external crates).
//!
//! Prefer importing from `mediaq_core::api` instead of reaching into internal modules.

pub use crate::config::{
    load_default, load_from, AppConfig, DownloadConfig, HttpServerConfig, LoggingConfig,
    StorageConfig, ToolsConfig, TranscribeConfig,
};
pub use crate::error::{CliError, RegistryError, TaskError};
pub use crate::registry::TaskRegistry;
pub use crate::rpc::{start_response_writer, Dispatcher, ResponseWriter, PROTOCOL_VERSION};
pub use crate::runner::{
    spawn_download, spawn_transcribe, DownloadMethod, DownloadSpec, TranscribeSpec,
};
pub use crate::service::{
    DownloadStarted, TaskList, TaskService, TaskSummary, TranscribeStarted,
};
pub use crate::task::{TaskKind, TaskRecord, TaskStatus};
