//! Per-process runtime information resolved during bootstrap and startup.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::identity::ProcessIdentity;
use crate::session_dir::SessionPaths;

/// Role a process plays within the runtime.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessRole {
    /// Head node process: launches and supervises the job.
    Hnp,
    /// Per-node daemon that hosts application processes.
    Daemon,
    /// Application process. Default role.
    #[default]
    App,
}

impl ProcessRole {
    /// Whether this process owns the real launch infrastructure.
    #[must_use]
    pub fn is_launcher(self) -> bool {
        matches!(self, Self::Hnp)
    }
}

/// Process-wide runtime information.
///
/// Written once while the runtime starts and read by everything after it.
#[derive(Debug, Clone)]
pub struct ProcessInfo {
    /// This process's identity.
    pub name: ProcessIdentity,
    /// Role within the runtime.
    pub role: ProcessRole,
    /// Host this process runs on.
    pub nodename: String,
    /// Optional root for session directories; the system temp dir otherwise.
    pub tmpdir_base: Option<PathBuf>,
    /// Head node process, resolved by routing.
    pub hnp: Option<ProcessIdentity>,
    /// Local daemon, resolved by routing.
    pub daemon: Option<ProcessIdentity>,
    /// Session directories, once created.
    pub session: Option<SessionPaths>,
}

impl ProcessInfo {
    /// Build process information for `name` running on `nodename`.
    #[must_use]
    pub fn new(name: ProcessIdentity, role: ProcessRole, nodename: impl Into<String>) -> Self {
        Self {
            name,
            role,
            nodename: nodename.into(),
            tmpdir_base: None,
            hnp: None,
            daemon: None,
            session: None,
        }
    }

    /// Whether this is the head node process.
    #[must_use]
    pub fn is_hnp(&self) -> bool {
        self.role == ProcessRole::Hnp
    }

    /// Whether this is a daemon.
    #[must_use]
    pub fn is_daemon(&self) -> bool {
        self.role == ProcessRole::Daemon
    }

    /// Per-process session directory, if it has been created.
    #[must_use]
    pub fn proc_session_dir(&self) -> Option<&Path> {
        self.session.as_ref().map(|paths| paths.proc_dir.as_path())
    }

    /// Drop identity and session state. The directories themselves are left
    /// on disk.
    pub fn release(&mut self) {
        self.name = ProcessIdentity::INVALID;
        self.hnp = None;
        self.daemon = None;
        self.session = None;
    }
}
