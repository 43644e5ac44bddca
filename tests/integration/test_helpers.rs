//! Shared helpers: recording collaborators and a scratch runtime context.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use ess_runtime::components::cr::CheckpointHook;
use ess_runtime::components::filem::FileTransfer;
use ess_runtime::components::grpcomm::GroupComm;
use ess_runtime::components::iof::IoForwarder;
use ess_runtime::components::plm::LaunchCoordinator;
use ess_runtime::components::routed::{RouteInfo, Router};
use ess_runtime::components::snapc::SnapshotCoordinator;
use ess_runtime::components::transport::Transport;
use ess_runtime::components::wait::WaitSubsystem;
use ess_runtime::components::{Collaborators, Framework, Module, SelectionQuery};
use ess_runtime::diagnostics::{DiagnosticOutput, HelpRenderer, HelpTopic};
use ess_runtime::models::{JobId, ProcessIdentity, ProcessInfo, ProcessRole};
use ess_runtime::{AppError, ErrorCode, Result, RuntimeContext};

/// Every collaborator call made during a startup that runs to completion,
/// fault tolerance off.
pub const STARTUP_EVENTS: &[&str] = &[
    "rml.open",
    "rml.select",
    "routed.open",
    "routed.select",
    "grpcomm.open",
    "grpcomm.select",
    "plm.init",
    "rml.enable_comm",
    "routed.init_routes",
    "iof.open",
    "iof.select",
    "cr.init",
];

/// Records collaborator calls in order and fails the ones it was told to.
#[derive(Clone, Default)]
pub struct Harness {
    journal: Arc<Mutex<Vec<String>>>,
    failures: Arc<Mutex<HashMap<String, ErrorCode>>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `event` (e.g. `routed.open`) fail with `code`.
    pub fn fail(&self, event: &str, code: ErrorCode) {
        self.failures
            .lock()
            .unwrap()
            .insert(event.to_owned(), code);
    }

    pub fn events(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.journal.lock().unwrap().clear();
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            rml: Framework::new("rml", vec![Box::new(self.module("rml")) as Box<dyn Transport>]),
            routed: Framework::new("routed", vec![Box::new(self.module("routed")) as Box<dyn Router>]),
            grpcomm: Framework::new(
                "grpcomm",
                vec![Box::new(self.module("grpcomm")) as Box<dyn GroupComm>],
            ),
            plm: Box::new(self.module("plm")),
            iof: Framework::new("iof", vec![Box::new(self.module("iof")) as Box<dyn IoForwarder>]),
            snapc: Framework::new(
                "snapc",
                vec![Box::new(self.module("snapc")) as Box<dyn SnapshotCoordinator>],
            ),
            filem: Box::new(self.module("filem")),
            wait: Box::new(self.module("wait")),
            cr: Box::new(self.module("cr")),
        }
    }

    fn module(&self, kind: &'static str) -> MockModule {
        MockModule {
            kind,
            harness: self.clone(),
        }
    }
}

struct MockModule {
    kind: &'static str,
    harness: Harness,
}

impl MockModule {
    fn step(&self, op: &str) -> Result<()> {
        let event = format!("{}.{op}", self.kind);
        self.harness.journal.lock().unwrap().push(event.clone());
        match self.harness.failures.lock().unwrap().get(&event) {
            Some(code) => Err(AppError::component(*code, format!("{event} refused"))),
            None => Ok(()),
        }
    }
}

impl Module for MockModule {
    fn name(&self) -> &str {
        self.kind
    }

    fn open(&mut self) -> Result<()> {
        self.step("open")
    }

    fn query(&self, _query: &SelectionQuery) -> Option<i32> {
        Some(1)
    }

    fn init(&mut self, _query: &SelectionQuery) -> Result<()> {
        self.step("select")
    }

    fn close(&mut self) -> Result<()> {
        self.step("close")
    }
}

impl Transport for MockModule {
    fn enable_comm(&mut self) -> Result<()> {
        self.step("enable_comm")
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

impl Router for MockModule {
    fn init_routes(&mut self, _job: JobId, _peers: Option<&[ProcessIdentity]>) -> Result<RouteInfo> {
        self.step("init_routes")?;
        Ok(RouteInfo {
            hnp: ProcessIdentity::hnp(),
            daemon: ProcessIdentity::new(0, 1),
        })
    }

    fn route(&self, target: &ProcessIdentity) -> Option<ProcessIdentity> {
        Some(*target)
    }
}

impl GroupComm for MockModule {}

impl IoForwarder for MockModule {
    fn collection_point(&self) -> Option<ProcessIdentity> {
        None
    }
}

impl SnapshotCoordinator for MockModule {}

impl LaunchCoordinator for MockModule {
    fn name(&self) -> &str {
        self.kind
    }

    fn init(&mut self, _info: &ProcessInfo) -> Result<()> {
        self.step("init")
    }
}

impl FileTransfer for MockModule {
    fn close(&mut self) -> Result<()> {
        self.step("close")
    }
}

impl WaitSubsystem for MockModule {
    fn finalize(&mut self) -> Result<()> {
        self.step("finalize")
    }
}

impl CheckpointHook for MockModule {
    fn init(&mut self, _fault_tolerance: bool) -> Result<()> {
        self.step("init")
    }

    fn finalize(&mut self) -> Result<()> {
        self.step("finalize")
    }

    fn is_active(&self) -> bool {
        false
    }
}

/// Help renderer that keeps every rendered message as `topic|stage|name|code`.
#[derive(Clone, Default)]
pub struct CapturedHelp(pub Arc<Mutex<Vec<String>>>);

impl HelpRenderer for CapturedHelp {
    fn render(&self, topic: HelpTopic, stage: &str, error_name: &str, code: i32) {
        self.0
            .lock()
            .unwrap()
            .push(format!("{}|{stage}|{error_name}|{code}", topic.name()));
    }
}

impl CapturedHelp {
    pub fn messages(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Identity used by every test context.
pub fn test_identity() -> ProcessIdentity {
    ProcessIdentity::new(7, 3)
}

/// Application-process context rooted in `tmp`.
pub fn test_context(tmp: &Path, fault_tolerance: bool) -> (RuntimeContext, CapturedHelp) {
    context_for(test_identity(), ProcessRole::App, tmp, fault_tolerance)
}

pub fn context_for(
    name: ProcessIdentity,
    role: ProcessRole,
    tmp: &Path,
    fault_tolerance: bool,
) -> (RuntimeContext, CapturedHelp) {
    let mut info = ProcessInfo::new(name, role, "testnode");
    info.tmpdir_base = Some(tmp.to_path_buf());
    let help = CapturedHelp::default();
    let ctx = RuntimeContext::new(
        info,
        fault_tolerance,
        DiagnosticOutput::new(),
        Box::new(help.clone()),
    );
    (ctx, help)
}
