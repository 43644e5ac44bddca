//! Snapshot coordination for checkpoint/restart. Opened only when fault
//! tolerance is configured.
//!
//! Each process class gets its own coordinator: the head node runs the
//! global one, daemons a local one, and application processes the app one.

use super::{Framework, Module, SelectionQuery};

/// Marker for snapshot coordinators. Snapshot protocols live outside this
/// crate.
pub trait SnapshotCoordinator: Module {}

/// Job-wide coordinator run by the head node.
#[derive(Debug, Default)]
pub struct GlobalCoordinator;

impl Module for GlobalCoordinator {
    fn name(&self) -> &str {
        "global"
    }

    fn query(&self, query: &SelectionQuery) -> Option<i32> {
        query.is_hnp.then_some(20)
    }
}

impl SnapshotCoordinator for GlobalCoordinator {}

/// Per-node coordinator run by daemons.
#[derive(Debug, Default)]
pub struct LocalCoordinator;

impl Module for LocalCoordinator {
    fn name(&self) -> &str {
        "local"
    }

    fn query(&self, query: &SelectionQuery) -> Option<i32> {
        (!query.is_app && !query.is_hnp).then_some(10)
    }
}

impl SnapshotCoordinator for LocalCoordinator {}

/// Coordinator for application processes.
#[derive(Debug, Default)]
pub struct AppCoordinator;

impl Module for AppCoordinator {
    fn name(&self) -> &str {
        "app"
    }

    fn query(&self, query: &SelectionQuery) -> Option<i32> {
        (query.is_app && !query.is_hnp).then_some(10)
    }
}

impl SnapshotCoordinator for AppCoordinator {}

/// Framework holding the built-in snapshot coordinators.
#[must_use]
pub fn framework() -> Framework<dyn SnapshotCoordinator> {
    Framework::new(
        "snapc",
        vec![
            Box::new(GlobalCoordinator),
            Box::new(LocalCoordinator),
            Box::new(AppCoordinator),
        ],
    )
}
