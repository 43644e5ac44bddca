// A reported abort leaves a zero-byte `abort` file in the session directory
// so the local daemon can tell this exit from a normal one without a core
// dump. The directory is not removed here: the marker has to outlive this
// process until whoever next finalizes the session directory reaps it.

use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use super::{AppEss, RuntimeContext, RuntimeState};
use crate::errors::ErrorCode;
use crate::models::ProcessInfo;

impl AppEss {
    /// Terminate the process immediately with `status`.
    ///
    /// Runs [`AppEss::abort_cleanup`] and exits. Finalize is never called
    /// because it may hang under the condition that caused the abort.
    pub fn abort(&mut self, ctx: &mut RuntimeContext, status: i32, report: bool) -> ! {
        self.abort_cleanup(ctx, report);
        std::process::exit(status)
    }

    /// Everything the abort path does short of exiting: stop the
    /// checkpoint/restart hook, drop the marker when `report` is set, and
    /// release the process identity. No collaborator is closed and the
    /// session directory stays on disk.
    ///
    /// Pass `report == false` when nobody is left to read the marker, such
    /// as a daemon whose head node has died.
    ///
    /// Returns the marker path when one was written.
    pub fn abort_cleanup(&mut self, ctx: &mut RuntimeContext, report: bool) -> Option<PathBuf> {
        // The hook may own a named pipe and a thread.
        if let Err(err) = self.components.cr.finalize() {
            warn!(%err, "checkpoint/restart hook did not stop cleanly");
        }

        let marker = if report {
            drop_abort_marker(&ctx.proc)
        } else {
            None
        };

        ctx.proc.release();
        ctx.state = RuntimeState::Aborted;
        marker
    }
}

fn drop_abort_marker(proc: &ProcessInfo) -> Option<PathBuf> {
    let Some(paths) = proc.session.as_ref() else {
        error!(
            error = ErrorCode::OutOfResource.name(),
            "no session directory to hold the abort marker"
        );
        return None;
    };

    let marker = paths.abort_marker();
    debug!(name = %proc.name, file = %marker.display(), "dropping abort marker");
    match create_marker(&marker) {
        Ok(()) => Some(marker),
        Err(err) => {
            warn!(file = %marker.display(), %err, "abort marker not created");
            None
        }
    }
}

#[cfg(unix)]
fn create_marker(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;

    std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .mode(0o600)
        .open(path)
        .map(drop)
}

#[cfg(not(unix))]
fn create_marker(path: &Path) -> std::io::Result<()> {
    std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .open(path)
        .map(drop)
}
