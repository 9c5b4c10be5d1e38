use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Pump one output stream into the shared line channel until EOF.
///
/// A final partial line without a trailing newline is still delivered.
/// Send failures mean the consumer went away; the pump keeps draining so the
/// child never blocks on a full pipe.
pub(crate) fn pump_lines<R>(rd: R, tx: mpsc::Sender<String>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(rd).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let _ = tx.send(line).await;
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!(error = %e, "output stream read error");
                    break;
                }
            }
        }
    })
}
