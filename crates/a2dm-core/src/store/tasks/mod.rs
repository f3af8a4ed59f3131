//! Task row operations, split into read and write halves.

mod read;
mod write;
