#![forbid(unsafe_code)]

//! Environment setup service for application processes of a distributed
//! runtime: ordered startup, best-effort finalize, and the minimal abort
//! path, plus the session-directory plumbing they share.

pub mod components;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod session_dir;
pub mod supervisor;

pub use config::RuntimeConfig;
pub use errors::{AppError, ErrorCode, Result};
pub use orchestrator::{AppEss, RuntimeContext};
