//! One subprocess, one supervisor.
//!
//! The supervisor owns the child's output streams, merges stdout and stderr
//! into a single ordered line feed (the wrapped tools interleave diagnostics
//! across both streams), and classifies the terminal outcome. It always
//! drains the streams so the child can never block on a full pipe, and the
//! exit code is never trusted alone: artifact-producing runs must also pass
//! the post-exit sanity check in [`artifact`].
//!
//! Supervisors run inside a detached runner task, so the subprocess goes to
//! completion whether or not any client is still polling.

mod artifact;
mod io_pump;

use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use crate::error::TaskError;

pub use artifact::{verify, ArtifactCheck};

/// Program plus argument list; no shell interpretation.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, a: impl Into<String>) -> Self {
        self.args.push(a.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    fn display(&self) -> String {
        let mut s = self.program.clone();
        for a in &self.args {
            s.push(' ');
            s.push_str(a);
        }
        s
    }
}

/// Bounded tail of recent output lines, kept for failure diagnostics.
#[derive(Debug)]
struct OutputTail {
    lines: VecDeque<String>,
    cap: usize,
}

impl OutputTail {
    fn new(cap: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(cap),
            cap,
        }
    }

    fn push(&mut self, line: &str) {
        if self.lines.len() == self.cap {
            self.lines.pop_front();
        }
        self.lines.push_back(line.to_string());
    }

    fn joined(&self) -> String {
        self.lines.iter().cloned().collect::<Vec<_>>().join("\n")
    }
}

const TAIL_LINES: usize = 40;

pub struct ProcessSupervisor {
    spec: CommandSpec,
}

impl ProcessSupervisor {
    pub fn new(spec: CommandSpec) -> Self {
        Self { spec }
    }

    /// Launch the subprocess with both output streams piped into one line
    /// channel. Start failure is `TaskError::Spawn`.
    pub fn spawn(self) -> Result<RunningProcess, TaskError> {
        let mut cmd = Command::new(&self.spec.program);
        cmd.args(&self.spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| TaskError::Spawn(format!("{}: {e}", self.spec.display())))?;

        let (tx, rx) = mpsc::channel::<String>(256);
        if let Some(stdout) = child.stdout.take() {
            io_pump::pump_lines(stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            io_pump::pump_lines(stderr, tx);
        }

        Ok(RunningProcess {
            child,
            lines: rx,
            tail: OutputTail::new(TAIL_LINES),
            spec: self.spec,
        })
    }
}

#[derive(Debug)]
pub struct RunningProcess {
    child: Child,
    lines: mpsc::Receiver<String>,
    tail: OutputTail,
    spec: CommandSpec,
}

impl RunningProcess {
    /// Next output line, in the order the subprocess produced it. `None`
    /// once both streams hit EOF.
    pub async fn next_line(&mut self) -> Option<String> {
        let line = self.lines.recv().await?;
        self.tail.push(&line);
        Some(line)
    }

    /// Wait for exit and classify the outcome.
    ///
    /// Clean exit + passing artifact check yields the verified artifact
    /// paths; anything else is `TaskError::Runtime` carrying the captured
    /// output tail.
    pub async fn finish(mut self, check: &ArtifactCheck) -> Result<Vec<PathBuf>, TaskError> {
        // Drain whatever the caller did not consume; output order still
        // matters for the diagnostic tail.
        while let Some(line) = self.lines.recv().await {
            self.tail.push(&line);
        }

        let status = self
            .child
            .wait()
            .await
            .map_err(|e| TaskError::Runtime(format!("wait failed: {e}")))?;

        if !status.success() {
            let code = status.code().map_or_else(
                || "terminated by signal".to_string(),
                |c| format!("exit code {c}"),
            );
            tracing::warn!(cmd = %self.spec.display(), %code, "subprocess failed");
            return Err(TaskError::Runtime(format!("{code}: {}", self.tail.joined())));
        }

        match verify(check).await {
            Ok(paths) => Ok(paths),
            Err(reason) => {
                tracing::warn!(cmd = %self.spec.display(), %reason, "artifact check failed after clean exit");
                Err(TaskError::Runtime(reason))
            }
        }
    }
}
