//! Worker thread that owns the tokio runtime and the chain session.

pub mod commands;
pub mod runtime;
