//! Serialized response output.
//!
//! Every concurrent handler sends finished lines into one channel; a single
//! writer task owns the output stream, so two responses can never interleave
//! mid-line.

use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct ResponseWriter {
    tx: mpsc::Sender<String>,
}

impl ResponseWriter {
    /// Queue one response line. Returns `false` when the writer task is gone.
    pub async fn send(&self, line: String) -> bool {
        self.tx.send(line).await.is_ok()
    }
}

/// Spawn the writer task over an output stream (stdout in production).
/// Dropping every `ResponseWriter` clone ends the task after it drains.
pub fn start_response_writer<W>(out: W) -> (ResponseWriter, JoinHandle<()>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
    let handle = tokio::spawn(async move {
        let mut out = BufWriter::new(out);
        while let Some(line) = rx.recv().await {
            if out.write_all(line.as_bytes()).await.is_err()
                || out.write_all(b"\n").await.is_err()
                || out.flush().await.is_err()
            {
                tracing::warn!("response stream closed, stopping writer");
                return;
            }
        }
        let _ = out.flush().await;
    });
    (ResponseWriter { tx }, handle)
}
