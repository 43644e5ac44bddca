use tracing::{debug, info, info_span, warn};

use super::{AppEss, RuntimeContext, RuntimeState};
use crate::{session_dir, Result};

impl AppEss {
    /// Tear down everything startup brought up, for a normal exit.
    ///
    /// Nothing is closed while something depending on it is still open. Each
    /// step is best-effort: failures are logged and the next step runs. The
    /// session directory is removed last. A context that is not running is
    /// left untouched.
    ///
    /// # Errors
    ///
    /// Currently never fails; teardown errors are logged, not returned.
    pub fn finalize(&mut self, ctx: &mut RuntimeContext) -> Result<()> {
        if ctx.state != RuntimeState::Running {
            debug!(state = ?ctx.state, "finalize skipped");
            return Ok(());
        }

        let span = info_span!("finalize", name = %ctx.proc.name);
        let _guard = span.enter();

        let c = &mut self.components;
        best_effort("cr_finalize", c.cr.finalize());
        if ctx.fault_tolerance_enabled {
            best_effort("snapc_close", c.snapc.close());
        }
        best_effort("filem_close", c.filem.close());
        best_effort("wait_finalize", c.wait.finalize());
        best_effort("iof_close", c.iof.close());

        // Group communication rides on routing, routing on the transport.
        best_effort("grpcomm_close", c.grpcomm.close());
        best_effort("routed_close", c.routed.close());
        best_effort("rml_close", c.rml.close());

        if let Some(path) = ctx.output.reset() {
            debug!(file = %path.display(), "diagnostic output returned to stderr");
        }
        if let Some(paths) = ctx.proc.session.take() {
            best_effort("session_dir_finalize", session_dir::remove(&paths));
        }

        ctx.state = RuntimeState::Finalized;
        info!("runtime finalized");
        Ok(())
    }
}

fn best_effort(step: &'static str, result: Result<()>) {
    if let Err(err) = result {
        warn!(step, %err, "teardown step failed, continuing");
    }
}
