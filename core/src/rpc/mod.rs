//! JSON-RPC over newline-delimited stdio.

mod dispatch;
pub mod protocol;
mod tools;
mod writer;

pub use dispatch::{Dispatcher, PROTOCOL_VERSION};
pub use writer::{start_response_writer, ResponseWriter};
