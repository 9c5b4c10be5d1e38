//! The stdio serve loop.
//!
//! Reads newline-delimited JSON-RPC from stdin and writes responses through
//! the single-writer channel, so stdout stays a clean protocol stream. All
//! logging goes to stderr or the log file.

use mediaq_core::api::{CliError, Dispatcher, TaskService};
use mediaq_core::rpc::start_response_writer;
use tokio::io::AsyncBufReadExt;

pub async fn run_serve(service: TaskService) -> Result<i32, CliError> {
    let dispatcher = Dispatcher::new(service);
    let (writer, writer_task) = start_response_writer(tokio::io::stdout());

    tracing::info!("mediaq stdio server ready");

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if let Some(response) = dispatcher.handle_line(&line).await {
            if !writer.send(response).await {
                break;
            }
        }
    }

    // stdin EOF: drain pending responses before exiting.
    drop(writer);
    let _ = writer_task.await;
    tracing::info!("stdin closed, shutting down");
    Ok(0)
}
