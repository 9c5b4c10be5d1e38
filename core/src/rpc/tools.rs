//! Tool catalog served by `tools/list`.

use serde_json::{json, Value};

/// The four tools, with their JSON Schema input contracts.
pub fn catalog() -> Value {
    json!([
        {
            "name": "download_video",
            "description": "Start a background video download. Returns a task_id immediately; poll get_progress to follow it.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "url": { "type": "string", "description": "Video page or stream URL" },
                    "output_dir": { "type": "string", "description": "Target directory (default: the downloads directory)" },
                    "filename": { "type": "string", "description": "Base filename without extension (default: video_<task_id>)" }
                },
                "required": ["url"]
            }
        },
        {
            "name": "transcribe_video",
            "description": "Extract audio from a local video and transcribe it with whisper. The transcript file grows while the task runs.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "video_path": { "type": "string", "description": "Path to a local video file" },
                    "output_dir": { "type": "string", "description": "Where to write the .mp3 and .txt (default: next to the video)" },
                    "output_filename": { "type": "string", "description": "Base filename without extension (default: the video's stem)" },
                    "language": { "type": "string", "description": "Speech language code, e.g. zh or en" }
                },
                "required": ["video_path"]
            }
        },
        {
            "name": "get_progress",
            "description": "Current status, percentage, stage and rate of one task.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "task_id": { "type": "string", "description": "Id returned by download_video or transcribe_video" },
                    "task_type": { "type": "string", "enum": ["download", "transcribe"], "description": "Optional kind check" }
                },
                "required": ["task_id"]
            }
        },
        {
            "name": "list_tasks",
            "description": "All known tasks, newest first, with summary counts.",
            "inputSchema": {
                "type": "object",
                "properties": {}
            }
        }
    ])
}
