//! HTTP网关：把stdio工具暴露为REST接口

pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod state;

pub use state::AppState;
