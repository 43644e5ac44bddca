//! Group communication: the collective substrate built on the transport.

use super::{Framework, Module, SelectionQuery};

/// Marker for group communication modules. Collectives are driven by code
/// outside the environment setup service; this layer only opens, selects and
/// closes the module.
pub trait GroupComm: Module {}

/// Built-in group communication module.
#[derive(Debug, Default)]
pub struct BasicGroupComm;

impl Module for BasicGroupComm {
    fn name(&self) -> &str {
        "basic"
    }

    fn query(&self, _query: &SelectionQuery) -> Option<i32> {
        Some(10)
    }
}

impl GroupComm for BasicGroupComm {}

/// Framework holding the built-in group communication modules.
#[must_use]
pub fn framework() -> Framework<dyn GroupComm> {
    Framework::new("grpcomm", vec![Box::new(BasicGroupComm)])
}
