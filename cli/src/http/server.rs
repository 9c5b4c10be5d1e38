//! HTTP服务器生命周期管理

use super::{middleware, routes::create_router, AppState};
use crate::commands::cli::HttpServerArgs;
use mediaq_core::api::{CliError, TaskService};
use std::net::SocketAddr;
use tokio::signal;
use tracing::info;

pub async fn run_http(service: TaskService, args: HttpServerArgs) -> Result<i32, CliError> {
    let cfg = service.config().http_server.clone();
    let host = args.host.unwrap_or(cfg.host);
    let port = args.port.unwrap_or(cfg.port);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| CliError::Config(format!("invalid bind address {host}:{port}: {e}")))?;

    let app = create_router(AppState::new(service))
        .layer(middleware::create_trace_layer())
        .layer(middleware::create_middleware_stack());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("mediaq http gateway listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("http gateway stopped");
    Ok(0)
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    info!("shutdown signal received");
}
