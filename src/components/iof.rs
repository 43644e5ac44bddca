//! I/O forwarding: ships child stdio to the collection point.

use tracing::debug;

use super::{Framework, Module, SelectionQuery};
use crate::models::ProcessIdentity;
use crate::Result;

/// Operations the runtime needs from the active forwarding module.
pub trait IoForwarder: Module {
    /// Process receiving forwarded output, once selected.
    fn collection_point(&self) -> Option<ProcessIdentity>;
}

/// Forwards output to the head node. Only selectable once routing has
/// resolved where the head node is.
#[derive(Debug, Default)]
pub struct ProxyForwarder {
    target: Option<ProcessIdentity>,
}

impl Module for ProxyForwarder {
    fn name(&self) -> &str {
        "proxy"
    }

    fn query(&self, query: &SelectionQuery) -> Option<i32> {
        query.collection_point.map(|_| 10)
    }

    fn init(&mut self, query: &SelectionQuery) -> Result<()> {
        self.target = query.collection_point;
        debug!(target = ?self.target, "forwarding output to collection point");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.target = None;
        Ok(())
    }
}

impl IoForwarder for ProxyForwarder {
    fn collection_point(&self) -> Option<ProcessIdentity> {
        self.target
    }
}

/// Framework holding the built-in forwarding modules.
#[must_use]
pub fn framework() -> Framework<dyn IoForwarder> {
    Framework::new("iof", vec![Box::new(ProxyForwarder::default())])
}
