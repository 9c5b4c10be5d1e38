//! Task record, kind and status types shared by every component.
//!
//! `TaskKind` and `TaskStatus` are closed enums on purpose: an unrecognized
//! status cannot pass through match arms unnoticed, and the wire names stay
//! pinned in one place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of external operation a task wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Download,
    Transcribe,
}

impl TaskKind {
    /// Prefix used in generated task ids ("dl-...", "tr-...").
    pub fn id_prefix(self) -> &'static str {
        match self {
            TaskKind::Download => "dl",
            TaskKind::Transcribe => "tr",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Download => "download",
            TaskKind::Transcribe => "transcribe",
        }
    }

    /// Parse the wire form used by `get_progress` ("download" | "transcribe").
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "download" => Some(TaskKind::Download),
            "transcribe" => Some(TaskKind::Transcribe),
            _ => None,
        }
    }
}

/// State-machine position of a task.
///
/// `Pending -> Running -> {Completed | Failed | Cancelled}`. Transitions only
/// move forward; the three terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    /// Whether moving from `self` to `to` is a legal forward transition.
    /// Staying in the same state is always allowed (progress updates keep
    /// `Running`).
    pub fn can_transition(self, to: TaskStatus) -> bool {
        if self == to {
            return true;
        }
        match self {
            TaskStatus::Pending => true,
            TaskStatus::Running => to.is_terminal(),
            _ => false,
        }
    }
}

/// The unit of work tracked by the system.
///
/// Mutated exclusively through [`crate::registry::TaskRegistry::update`],
/// which enforces the forward-only state machine and percentage monotonicity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(rename = "task_id")]
    pub id: String,

    pub kind: TaskKind,

    pub status: TaskStatus,

    /// 0..=100; non-decreasing while non-terminal, frozen once terminal.
    /// 100 is reserved for the supervisor's confirmed-success path.
    pub percentage: u8,

    /// Human-readable sub-phase label. Advisory only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,

    /// Derived rate estimate such as "12 KB/s". Advisory only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<String>,

    pub elapsed_seconds: u64,

    /// URL or source file path supplied at creation. Immutable.
    pub input: String,

    /// Produced file paths; empty until `status == Completed`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<String>,

    /// Set exactly when `status == Failed` (and on cancellation, carrying the
    /// cancellation note, as the original gateway did).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    pub fn new(id: String, kind: TaskKind, input: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            kind,
            status: TaskStatus::Pending,
            percentage: 0,
            stage: None,
            speed: None,
            elapsed_seconds: 0,
            input,
            artifacts: Vec::new(),
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}
