//! mediaq-core: task supervision and progress extraction for long-running
//! media CLI tools, exposed over a JSON-RPC line protocol.

pub mod api;
pub mod config;
pub mod error;
pub mod probe;
pub mod progress;
pub mod registry;
pub mod rpc;
pub mod runner;
pub mod service;
pub mod supervisor;
pub mod task;
