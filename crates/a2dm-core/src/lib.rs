pub mod checkpoint;
pub mod config;
pub mod control;
pub mod engine;
pub mod logging;
pub mod manager;
pub mod naming;
pub mod progress;
pub mod store;
pub mod task;
