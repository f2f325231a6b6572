pub mod config_cmd;
pub mod models;
pub mod run;
pub mod runtime;
pub mod task;
