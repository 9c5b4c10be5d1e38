use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub download: DownloadConfig,

    #[serde(default)]
    pub transcribe: TranscribeConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub http_server: HttpServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr. stdout is reserved for the RPC stream.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "mediaq_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

/// Paths and fixed arguments of the external tools the engine drives. All of
/// them are black boxes beyond the output-format heuristics in
/// `crate::progress`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,

    /// Whisper-compatible transcription CLI. Must print
    /// `[MM:SS.mmm --> MM:SS.mmm] text` segment lines when verbose.
    #[serde(default = "default_whisper")]
    pub whisper: String,

    #[serde(default = "default_whisper_model")]
    pub whisper_model: String,

    /// Media-acquisition program (e.g. a yt-dlp wrapper script). Must emit
    /// free-text lines containing a percentage figure while downloading.
    #[serde(default = "default_downloader")]
    pub downloader: String,

    /// Extra arguments appended to every downloader invocation.
    #[serde(default)]
    pub downloader_args: Vec<String>,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_whisper() -> String {
    "whisper".to_string()
}

fn default_whisper_model() -> String {
    "base".to_string()
}

fn default_downloader() -> String {
    "yt-dlp".to_string()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
            whisper: default_whisper(),
            whisper_model: default_whisper_model(),
            downloader: default_downloader(),
            downloader_args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Default output directory; `~/Downloads` when unset.
    #[serde(default)]
    pub output_dir: Option<String>,

    #[serde(default = "default_quality")]
    pub quality: String,
}

fn default_quality() -> String {
    "fhd".to_string()
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            quality: default_quality(),
        }
    }
}

/// Constants of the two-phase transcription progress heuristic.
///
/// `bytes_per_minute` is an acknowledged approximation (roughly 1 MiB of MP3
/// per audio minute at the quality the extractor uses). It is configuration,
/// not codec-aware logic; adjust it if your ffmpeg invocation differs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscribeConfig {
    #[serde(default = "default_bytes_per_minute")]
    pub bytes_per_minute: u64,

    /// Ceiling of the extraction phase (percent).
    #[serde(default = "default_extract_ceiling")]
    pub extract_ceiling: u8,

    /// Floor of the transcription band (percent).
    #[serde(default = "default_band_floor")]
    pub band_floor: u8,

    /// Ceiling of the transcription band; 100 is reserved for confirmed
    /// completion.
    #[serde(default = "default_band_ceiling")]
    pub band_ceiling: u8,

    /// How often the growing mp3 is stat'ed during extraction.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_language")]
    pub default_language: String,

    /// Assumed duration when the probe fails (seconds).
    #[serde(default = "default_fallback_duration")]
    pub fallback_duration_secs: f64,
}

fn default_bytes_per_minute() -> u64 {
    1024 * 1024
}

fn default_extract_ceiling() -> u8 {
    15
}

fn default_band_floor() -> u8 {
    16
}

fn default_band_ceiling() -> u8 {
    98
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_language() -> String {
    "zh".to_string()
}

fn default_fallback_duration() -> f64 {
    3600.0
}

impl Default for TranscribeConfig {
    fn default() -> Self {
        Self {
            bytes_per_minute: default_bytes_per_minute(),
            extract_ceiling: default_extract_ceiling(),
            band_floor: default_band_floor(),
            band_ceiling: default_band_ceiling(),
            poll_interval_ms: default_poll_interval_ms(),
            default_language: default_language(),
            fallback_duration_secs: default_fallback_duration(),
        }
    }
}

/// Durable persistence for the task registry. When disabled the registry is
/// a process-lifetime in-memory map, which still satisfies the read/write
/// contract.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub persist: bool,

    /// Snapshot file path; `~/.mediaq/tasks.json` when unset.
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_http_host")]
    pub host: String,

    #[serde(default = "default_http_port")]
    pub port: u16,
}

fn default_http_host() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    5124
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
        }
    }
}
