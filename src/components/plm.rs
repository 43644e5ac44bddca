//! Process launch coordinator.
//!
//! The head node owns the real launch infrastructure; every other process
//! gets a proxy that forwards launch requests to it. Both expose the same
//! `init`, so startup never needs to know which one it holds.

use tracing::{debug, info};

use crate::errors::ErrorCode;
use crate::models::{ProcessIdentity, ProcessInfo, ProcessRole};
use crate::{AppError, Result};

/// Launch coordination as seen by the environment setup service.
pub trait LaunchCoordinator: Send {
    /// Implementation name.
    fn name(&self) -> &str;

    /// Prepare the coordinator for `info`.
    ///
    /// # Errors
    ///
    /// Implementation-specific.
    fn init(&mut self, info: &ProcessInfo) -> Result<()>;
}

/// Full launcher, present on the head node.
#[derive(Debug, Default)]
pub struct Launcher {
    daemons: Vec<ProcessIdentity>,
}

impl Launcher {
    /// Daemons known to the launcher; the head node is always the first.
    #[must_use]
    pub fn daemons(&self) -> &[ProcessIdentity] {
        &self.daemons
    }
}

impl LaunchCoordinator for Launcher {
    fn name(&self) -> &str {
        "launcher"
    }

    fn init(&mut self, info: &ProcessInfo) -> Result<()> {
        if !info.is_hnp() {
            return Err(AppError::component(
                ErrorCode::NotSupported,
                format!("launcher cannot run on a {:?} process", info.role),
            ));
        }
        self.daemons = vec![info.name];
        info!(name = %info.name, node = %info.nodename, "launch infrastructure ready");
        Ok(())
    }
}

/// Lightweight proxy used by daemons and application processes.
#[derive(Debug, Default)]
pub struct LaunchProxy {
    ready: bool,
}

impl LaunchProxy {
    /// Whether `init` has run.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }
}

impl LaunchCoordinator for LaunchProxy {
    fn name(&self) -> &str {
        "proxy"
    }

    fn init(&mut self, info: &ProcessInfo) -> Result<()> {
        self.ready = true;
        debug!(name = %info.name, "launch proxy initialized");
        Ok(())
    }
}

/// The coordinator variant for `role`.
#[must_use]
pub fn for_role(role: ProcessRole) -> Box<dyn LaunchCoordinator> {
    if role.is_launcher() {
        Box::new(Launcher::default())
    } else {
        Box::new(LaunchProxy::default())
    }
}
