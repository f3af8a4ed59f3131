//! Persistent task store (SQLite via sqlx).
//!
//! Holds every task's configuration and status plus an append-only per-task
//! history that survives manager restarts. Progress samples are never stored
//! as state; at most they land in history as log entries.

pub mod db;
pub mod types;

mod history;
mod tasks;

#[cfg(test)]
mod tests;

pub use db::*;
pub use types::*;
