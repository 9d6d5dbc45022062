pub mod commands;
pub mod config;
pub mod error;
pub mod graph;
pub mod logging;
pub mod model;
pub mod next;
pub mod output;
pub mod report;
pub mod store;
pub mod task_id;
