pub mod init;

pub use init::{init_tracing_and_env, load_planner};
