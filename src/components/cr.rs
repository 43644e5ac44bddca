//! Checkpoint/restart runtime hook.
//!
//! Initialized on every process, fault tolerance or not: external tools wait
//! for the hook's handshake and hang when it never shows up.

use tracing::{debug, info};

use crate::Result;

/// The always-present checkpoint/restart hook.
pub trait CheckpointHook: Send {
    /// Register the hook. `fault_tolerance` tells whether checkpointing is
    /// live or the hook only answers the handshake.
    ///
    /// # Errors
    ///
    /// Implementation-specific.
    fn init(&mut self, fault_tolerance: bool) -> Result<()>;

    /// Unregister the hook and stop anything it runs in the background.
    ///
    /// # Errors
    ///
    /// Implementation-specific.
    fn finalize(&mut self) -> Result<()>;

    /// Whether the hook is registered.
    fn is_active(&self) -> bool;
}

/// Built-in hook.
#[derive(Debug, Default)]
pub struct CrHook {
    active: bool,
    checkpointing: bool,
}

impl CrHook {
    /// Whether checkpoint requests are honored.
    #[must_use]
    pub fn is_checkpointing(&self) -> bool {
        self.checkpointing
    }
}

impl CheckpointHook for CrHook {
    fn init(&mut self, fault_tolerance: bool) -> Result<()> {
        self.active = true;
        self.checkpointing = fault_tolerance;
        info!(fault_tolerance, "checkpoint/restart hook registered");
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        if self.active {
            debug!("checkpoint/restart hook unregistered");
        }
        self.active = false;
        self.checkpointing = false;
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
