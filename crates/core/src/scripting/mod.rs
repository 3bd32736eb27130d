//! Script process supervision.
//!
//! [`runner::ScriptRunner`] spawns the configured command, merges its
//! stdout and stderr into one ordered event stream and guarantees the
//! child is reaped on every exit path (normal exit, timeout, cancellation).

pub mod command;
pub mod runner;
pub mod stream;

pub use command::{RunnerCommand, RunnerLimits, ScriptError};
pub use runner::{RunHandle, ScriptRunner};
pub use stream::{OutputChunk, OutputStream, ProcessEvent};
