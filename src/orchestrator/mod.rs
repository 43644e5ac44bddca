//! Startup, finalize and abort orchestration for application processes.
//!
//! [`AppEss`] owns the collaborators and drives them in dependency order;
//! [`RuntimeContext`] carries the process-wide state every stage reads or
//! writes. The context is created once by the caller and passed explicitly.

mod abort;
mod finalize;
mod startup;

use std::fmt::{Display, Formatter};

use crate::components::Collaborators;
use crate::diagnostics::{DiagnosticOutput, HelpRenderer};
use crate::errors::ErrorCode;
use crate::models::ProcessInfo;
use crate::AppError;

/// Lifecycle of the runtime within one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    /// Startup has not completed.
    Uninitialized,
    /// Startup completed; collaborators are live.
    Running,
    /// Finalize ran.
    Finalized,
    /// The abort path ran; the process is about to exit.
    Aborted,
}

/// Process-wide state threaded through startup, finalize and abort.
pub struct RuntimeContext {
    /// Identity, role, placement and session paths.
    pub proc: ProcessInfo,
    /// Redirectable diagnostic stream.
    pub output: DiagnosticOutput,
    help: Box<dyn HelpRenderer>,
    fault_tolerance_configured: bool,
    fault_tolerance_enabled: bool,
    state: RuntimeState,
}

impl RuntimeContext {
    /// Context for `proc`. `fault_tolerance` decides whether startup brings
    /// up snapshot coordination.
    #[must_use]
    pub fn new(
        proc: ProcessInfo,
        fault_tolerance: bool,
        output: DiagnosticOutput,
        help: Box<dyn HelpRenderer>,
    ) -> Self {
        Self {
            proc,
            output,
            help,
            fault_tolerance_configured: fault_tolerance,
            fault_tolerance_enabled: false,
            state: RuntimeState::Uninitialized,
        }
    }

    /// Whether checkpoint machinery is active. Set once, near the end of
    /// startup.
    #[must_use]
    pub fn fault_tolerance_enabled(&self) -> bool {
        self.fault_tolerance_enabled
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> RuntimeState {
        self.state
    }
}

impl std::fmt::Debug for RuntimeContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeContext")
            .field("proc", &self.proc)
            .field("output", &self.output)
            .field("fault_tolerance_configured", &self.fault_tolerance_configured)
            .field("fault_tolerance_enabled", &self.fault_tolerance_enabled)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Named startup stages, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Open the messaging transport framework.
    RmlOpen,
    /// Select the messaging transport.
    RmlSelect,
    /// Open the routing framework.
    RoutedOpen,
    /// Select the routing module.
    RoutedSelect,
    /// Open the group communication framework.
    GrpcommOpen,
    /// Select the group communication module.
    GrpcommSelect,
    /// Initialize the launch coordinator.
    PlmInit,
    /// Enable transport communication.
    RmlEnableComm,
    /// Render the job id for the session directory.
    ConvertJobId,
    /// Render the rank for the session directory.
    ConvertRank,
    /// Create the session directory.
    SessionDir,
    /// Initialize routes for the local job.
    InitRoutes,
    /// Open the I/O forwarding framework.
    IofOpen,
    /// Select the I/O forwarder.
    IofSelect,
    /// Open snapshot coordination.
    SnapcOpen,
    /// Select the snapshot coordinator.
    SnapcSelect,
    /// Initialize the checkpoint/restart hook.
    CrInit,
}

impl Stage {
    /// Name shown in startup diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::RmlOpen => "rml_open",
            Self::RmlSelect => "rml_select",
            Self::RoutedOpen => "routed_open",
            Self::RoutedSelect => "routed_select",
            Self::GrpcommOpen => "grpcomm_open",
            Self::GrpcommSelect => "grpcomm_select",
            Self::PlmInit => "plm_init",
            Self::RmlEnableComm => "rml_enable_comm",
            Self::ConvertJobId => "convert_jobid_to_string",
            Self::ConvertRank => "convert_rank_to_string",
            Self::SessionDir => "session_dir",
            Self::InitRoutes => "routed_init_routes",
            Self::IofOpen => "iof_open",
            Self::IofSelect => "iof_select",
            Self::SnapcOpen => "snapc_open",
            Self::SnapcSelect => "snapc_select",
            Self::CrInit => "cr_init",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The stage that stopped startup and what it returned.
#[derive(Debug)]
pub struct StartupError {
    stage: Stage,
    source: AppError,
}

impl StartupError {
    /// Failure of `stage` with `source`.
    #[must_use]
    pub fn new(stage: Stage, source: AppError) -> Self {
        Self { stage, source }
    }

    /// Stage that failed.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Error code the stage returned.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.source.code()
    }

    /// Symbolic name of the error code.
    #[must_use]
    pub fn error_name(&self) -> &'static str {
        self.code().name()
    }

    /// The stage's own error.
    #[must_use]
    pub fn source_error(&self) -> &AppError {
        &self.source
    }
}

impl Display for StartupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.source)
    }
}

impl std::error::Error for StartupError {}

/// Environment setup service for application processes.
#[derive(Debug)]
pub struct AppEss {
    components: Collaborators,
}

impl AppEss {
    /// Service driving `components`.
    #[must_use]
    pub fn new(components: Collaborators) -> Self {
        Self { components }
    }

    /// The collaborators, for inspection.
    #[must_use]
    pub fn components(&self) -> &Collaborators {
        &self.components
    }
}
