//! Supervision of the external download engine (aria2c).
//!
//! `args` derives the engine argv from task configuration; `worker` owns one
//! spawned engine process together with its output readers and termination.

mod args;
mod error;
mod worker;

pub use args::{build_args, engine_binary, split_args};
pub use error::SpawnError;
pub use worker::{Worker, WorkerState};
