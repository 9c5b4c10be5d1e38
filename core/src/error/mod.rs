use thiserror::Error;

/// Errors surfaced synchronously at the API/RPC boundary or captured into a
/// task's `error` field by its owning runner. One task's failure never
/// propagates to another task.
#[derive(Error, Debug)]
pub enum TaskError {
    /// Missing/empty required input field; rejected before any task exists.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("task not found: {0}")]
    NotFound(String),

    #[error("unknown task type: {0}")]
    UnknownKind(String),

    /// Subprocess could not be launched.
    #[error("process start failed: {0}")]
    Spawn(String),

    /// Non-zero exit, or zero exit with a failed artifact sanity check.
    #[error("process failed: {0}")]
    Runtime(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("task not found: {0}")]
    NotFound(String),

    /// The mutation tried to move the state machine backwards (e.g. out of
    /// `Running` into `Pending`). Updates against an already-terminal record
    /// are not reported through this variant; they are accepted no-ops, see
    /// `TaskRegistry::update`.
    #[error("invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: crate::task::TaskStatus,
        to: crate::task::TaskStatus,
    },
}

/// Top-level error for the `mediaq` binary.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("task error: {0}")]
    Task(#[from] TaskError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}
