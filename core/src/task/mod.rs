pub mod id_gen;
pub mod types;

pub use id_gen::generate_task_id;
pub use types::{TaskKind, TaskRecord, TaskStatus};
