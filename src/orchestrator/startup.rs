use tracing::{debug, error, info, info_span, warn};

use super::{AppEss, RuntimeContext, RuntimeState, Stage, StartupError};
use crate::components::SelectionQuery;
use crate::diagnostics::HelpTopic;
use crate::models::ProcessInfo;
use crate::{session_dir, Result};

/// Prefix of the diagnostic output file inside the session directory.
const OUTPUT_PREFIX: &str = "output-";

impl AppEss {
    /// Bring every collaborator online in dependency order.
    ///
    /// Stages run strictly one after another; the first failure stops the
    /// sequence, is rendered through the help renderer, and is returned.
    /// Nothing that already started is undone: cleaning up a half-started
    /// process is the caller's job, normally through [`AppEss::abort`].
    ///
    /// Routing initialization may block for as long as the active routing
    /// module needs to collect peer contact information.
    ///
    /// Calling `startup` on a running context returns immediately.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Startup` naming the failed stage and carrying the
    /// stage's error code.
    pub fn startup(&mut self, ctx: &mut RuntimeContext) -> Result<()> {
        if ctx.state == RuntimeState::Running {
            debug!("runtime already running");
            return Ok(());
        }

        let span = info_span!("startup", name = %ctx.proc.name, role = ?ctx.proc.role);
        let _guard = span.enter();

        match self.run_stages(ctx) {
            Ok(()) => {
                ctx.state = RuntimeState::Running;
                info!(
                    fault_tolerance = ctx.fault_tolerance_enabled,
                    "runtime startup complete"
                );
                Ok(())
            }
            Err(failure) => {
                let code = failure.code();
                error!(
                    stage = failure.stage().name(),
                    error = code.name(),
                    code = code.value(),
                    "runtime startup failed: {}",
                    failure.source_error()
                );
                ctx.help.render(
                    HelpTopic::StartupInternalFailure,
                    failure.stage().name(),
                    code.name(),
                    code.value(),
                );
                Err(failure.into())
            }
        }
    }

    fn run_stages(&mut self, ctx: &mut RuntimeContext) -> std::result::Result<(), StartupError> {
        let c = &mut self.components;
        let query = SelectionQuery::for_process(&ctx.proc);

        stage(Stage::RmlOpen, c.rml.open())?;
        stage(Stage::RmlSelect, c.rml.select(&query))?;
        stage(Stage::RoutedOpen, c.routed.open())?;
        stage(Stage::RoutedSelect, c.routed.select(&query))?;
        stage(Stage::GrpcommOpen, c.grpcomm.open())?;
        stage(Stage::GrpcommSelect, c.grpcomm.select(&query))?;

        // Launcher on the head node, proxy everywhere else.
        stage(Stage::PlmInit, c.plm.init(&ctx.proc))?;

        stage(
            Stage::RmlEnableComm,
            c.rml.active_mut().and_then(|rml| rml.enable_comm()),
        )?;

        setup_session_dir(&mut ctx.proc)?;
        redirect_output(ctx);

        let job = ctx.proc.name.job;
        let routes = stage(
            Stage::InitRoutes,
            c.routed
                .active_mut()
                .and_then(|routed| routed.init_routes(job, None)),
        )?;
        ctx.proc.hnp = Some(routes.hnp);
        ctx.proc.daemon = Some(routes.daemon);
        debug!(hnp = %routes.hnp, daemon = %routes.daemon, "routes initialized");

        // The forwarder needs the collection point routing just resolved.
        let query = SelectionQuery::for_process(&ctx.proc);
        stage(Stage::IofOpen, c.iof.open())?;
        stage(Stage::IofSelect, c.iof.select(&query))?;

        if ctx.fault_tolerance_configured {
            stage(Stage::SnapcOpen, c.snapc.open())?;
            stage(Stage::SnapcSelect, c.snapc.select(&query))?;
            ctx.fault_tolerance_enabled = true;
        } else {
            ctx.fault_tolerance_enabled = false;
        }

        // Unconditional: external tools wait on this handshake.
        stage(Stage::CrInit, c.cr.init(ctx.fault_tolerance_enabled))?;

        Ok(())
    }
}

fn stage<T>(stage: Stage, result: Result<T>) -> std::result::Result<T, StartupError> {
    result.map_err(|source| StartupError::new(stage, source))
}

fn setup_session_dir(proc: &mut ProcessInfo) -> std::result::Result<(), StartupError> {
    let job = stage(Stage::ConvertJobId, proc.name.job.to_path_string())?;
    let rank = stage(Stage::ConvertRank, proc.name.rank.to_path_string())?;

    debug!(
        tmpdir = %proc
            .tmpdir_base
            .as_deref()
            .map_or_else(|| "UNDEF".into(), |base| base.display().to_string()),
        host = %proc.nodename,
        job = %job,
        rank = %rank,
        "setting up session dir"
    );

    let paths = stage(
        Stage::SessionDir,
        session_dir::create(
            true,
            proc.tmpdir_base.as_deref(),
            &proc.nodename,
            &job,
            &rank,
        ),
    )?;
    proc.session = Some(paths);
    Ok(())
}

fn redirect_output(ctx: &RuntimeContext) {
    let Some(dir) = ctx.proc.proc_session_dir() else {
        return;
    };
    let name = format!("{}.{}.log", ctx.proc.name.job, ctx.proc.name.rank);
    match ctx.output.redirect_to_dir(dir, OUTPUT_PREFIX, &name) {
        Ok(path) => debug!(file = %path.display(), "diagnostic output redirected"),
        Err(err) => warn!(%err, "diagnostic output stays on stderr"),
    }
}
