//! Request dispatch for the stdio transport.
//!
//! One line in, at most one line out. Notifications (missing or `null` id)
//! never produce output, not even on error. Lines that are not JSON at all
//! are dropped; there is no id to correlate an answer with, and echoing
//! garbage back would only confuse the client.

use serde_json::{json, Value};

use crate::error::TaskError;
use crate::service::TaskService;

use super::protocol::{
    recover_id, JsonRpcRequest, JsonRpcResponse, INVALID_PARAMS, INVALID_REQUEST,
    METHOD_NOT_FOUND, TOOL_ERROR,
};
use super::tools;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub struct Dispatcher {
    service: TaskService,
}

impl Dispatcher {
    pub fn new(service: TaskService) -> Self {
        Self { service }
    }

    /// Handle one input line; `Some` is a serialized response to write back.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let value: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(error = %e, "dropping non-JSON input line");
                return None;
            }
        };

        let request: JsonRpcRequest = match serde_json::from_value(value.clone()) {
            Ok(r) => r,
            Err(e) => {
                // JSON, but not a request. Answer only with a recoverable id.
                let id = recover_id(&value)?;
                return serialize(JsonRpcResponse::failure(
                    id,
                    INVALID_REQUEST,
                    format!("invalid request: {e}"),
                ));
            }
        };

        let notification = request.is_notification();
        let response = self.dispatch(request).await;
        if notification {
            return None;
        }
        response.and_then(serialize)
    }

    async fn dispatch(&self, req: JsonRpcRequest) -> Option<JsonRpcResponse> {
        tracing::debug!(method = %req.method, "rpc request");
        match req.method.as_str() {
            "initialize" => Some(JsonRpcResponse::success(
                req.id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": { "tools": {} },
                    "serverInfo": {
                        "name": "mediaq",
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                }),
            )),
            "notifications/initialized" => None,
            "ping" => Some(JsonRpcResponse::success(req.id, json!({}))),
            "tools/list" => Some(JsonRpcResponse::success(
                req.id,
                json!({ "tools": tools::catalog() }),
            )),
            "tools/call" => Some(self.call_tool(req.id, &req.params).await),
            other => Some(JsonRpcResponse::failure(
                req.id,
                METHOD_NOT_FOUND,
                format!("method not found: {other}"),
            )),
        }
    }

    async fn call_tool(&self, id: Value, params: &Value) -> JsonRpcResponse {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return JsonRpcResponse::failure(id, INVALID_PARAMS, "missing tool name");
        };
        let args = params.get("arguments").cloned().unwrap_or(Value::Null);

        let outcome = match name {
            "download_video" => {
                let Some(url) = str_arg(&args, "url") else {
                    return JsonRpcResponse::failure(id, INVALID_PARAMS, "url is required");
                };
                self.service
                    .create_download(url, str_arg(&args, "output_dir"), str_arg(&args, "filename"))
                    .await
                    .and_then(to_json)
            }
            "transcribe_video" => {
                let Some(path) = str_arg(&args, "video_path") else {
                    return JsonRpcResponse::failure(id, INVALID_PARAMS, "video_path is required");
                };
                self.service
                    .create_transcribe(
                        path,
                        str_arg(&args, "output_dir"),
                        str_arg(&args, "output_filename"),
                        str_arg(&args, "language"),
                    )
                    .await
                    .and_then(to_json)
            }
            "get_progress" => {
                let Some(task_id) = str_arg(&args, "task_id") else {
                    return JsonRpcResponse::failure(id, INVALID_PARAMS, "task_id is required");
                };
                self.service
                    .get_progress(task_id, str_arg(&args, "task_type"))
                    .await
                    .and_then(to_json)
            }
            "list_tasks" => to_json(self.service.list_tasks().await),
            other => {
                return JsonRpcResponse::failure(
                    id,
                    INVALID_PARAMS,
                    format!("unknown tool: {other}"),
                );
            }
        };

        match outcome {
            Ok(value) => JsonRpcResponse::success(id, text_content(&value)),
            Err(e) => {
                let code = match e {
                    TaskError::Validation(_) | TaskError::UnknownKind(_) => INVALID_PARAMS,
                    _ => TOOL_ERROR,
                };
                JsonRpcResponse::failure(id, code, e.to_string())
            }
        }
    }
}

/// Wrap a tool result as MCP text content, pretty-printed for human readers.
fn text_content(value: &Value) -> Value {
    let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    json!({ "content": [ { "type": "text", "text": text } ] })
}

fn to_json<T: serde::Serialize>(value: T) -> Result<Value, TaskError> {
    serde_json::to_value(value)
        .map_err(|e| TaskError::Runtime(format!("response serialization failed: {e}")))
}

fn str_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

fn serialize(resp: JsonRpcResponse) -> Option<String> {
    match serde_json::to_string(&resp) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize rpc response");
            None
        }
    }
}
