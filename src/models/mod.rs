//! Process-level data model.

pub mod identity;
pub mod process;

pub use identity::{JobId, ProcessIdentity, Rank};
pub use process::{ProcessInfo, ProcessRole};
