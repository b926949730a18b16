//! WeLearn Autopilot — library crate.
//!
//! Emulates the WeLearn platform's browser SSO handshake, then impersonates
//! its client-side SCORM runtime to report full completion for each course
//! unit. The binary in `src/main.rs` wires the interactive CLI on top.

pub mod auth;
pub mod cli;
pub mod course;
pub mod error;
pub mod forge;
pub mod http;
pub mod runner;
