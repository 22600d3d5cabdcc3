pub mod choose;
pub mod task_ops;
