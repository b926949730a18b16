//! CLI implementation for the `welearn` binary.

pub mod prompt;
pub mod run_cmd;
