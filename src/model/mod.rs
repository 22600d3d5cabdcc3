pub mod config;
pub mod task;

pub use config::*;
pub use task::*;
