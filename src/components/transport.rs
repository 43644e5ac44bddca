//! Messaging transport: point-to-point messages between runtime processes.

use tracing::debug;

use super::{Framework, Module, SelectionQuery};
use crate::Result;

/// Operations the runtime needs from the active transport.
pub trait Transport: Module {
    /// Start accepting inbound and sending outbound messages.
    ///
    /// # Errors
    ///
    /// Module-specific.
    fn enable_comm(&mut self) -> Result<()>;

    /// Whether communication has been enabled.
    fn is_enabled(&self) -> bool;
}

/// Built-in out-of-band transport. Holds only its enablement state; the wire
/// protocol lives outside this crate.
#[derive(Debug, Default)]
pub struct OobTransport {
    enabled: bool,
}

impl Module for OobTransport {
    fn name(&self) -> &str {
        "oob"
    }

    fn query(&self, _query: &SelectionQuery) -> Option<i32> {
        Some(10)
    }

    fn close(&mut self) -> Result<()> {
        self.enabled = false;
        Ok(())
    }
}

impl Transport for OobTransport {
    fn enable_comm(&mut self) -> Result<()> {
        self.enabled = true;
        debug!(module = self.name(), "communication enabled");
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Framework holding the built-in transports.
#[must_use]
pub fn framework() -> Framework<dyn Transport> {
    Framework::new("rml", vec![Box::new(OobTransport::default())])
}
