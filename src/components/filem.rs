//! File transfer subsystem. Only its teardown is driven from here.

use tracing::debug;

use crate::Result;

/// File transfer as seen by the environment setup service.
pub trait FileTransfer: Send {
    /// Release the subsystem.
    ///
    /// # Errors
    ///
    /// Implementation-specific.
    fn close(&mut self) -> Result<()>;
}

/// Built-in file transfer that copies with plain file-system calls.
#[derive(Debug, Default)]
pub struct RawFileTransfer {
    closed: bool,
}

impl RawFileTransfer {
    /// Whether `close` has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl FileTransfer for RawFileTransfer {
    fn close(&mut self) -> Result<()> {
        self.closed = true;
        debug!("file transfer closed");
        Ok(())
    }
}
