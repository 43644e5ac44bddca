//! Asynchronous wait subsystem (child-exit and timer callbacks). Only its
//! teardown is driven from here.

use tracing::debug;

use crate::Result;

/// Wait subsystem as seen by the environment setup service.
pub trait WaitSubsystem: Send {
    /// Cancel outstanding callbacks and release the subsystem.
    ///
    /// # Errors
    ///
    /// Implementation-specific.
    fn finalize(&mut self) -> Result<()>;
}

/// Built-in event-driven wait subsystem.
#[derive(Debug, Default)]
pub struct EventWait {
    finalized: bool,
}

impl EventWait {
    /// Whether `finalize` has run.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}

impl WaitSubsystem for EventWait {
    fn finalize(&mut self) -> Result<()> {
        self.finalized = true;
        debug!("wait subsystem finalized");
        Ok(())
    }
}
