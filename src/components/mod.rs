//! Pluggable runtime collaborators.
//!
//! Every collaborator kind with several possible implementations lives in a
//! [`Framework`], which owns the "open then select" step: candidates are
//! opened, asked for a priority against the current [`SelectionQuery`], and
//! the winner becomes the active module. The orchestrator only ever talks to
//! the active module through the collaborator trait.

pub mod cr;
pub mod filem;
pub mod grpcomm;
pub mod iof;
pub mod plm;
pub mod routed;
pub mod snapc;
pub mod transport;
pub mod wait;

use std::fmt::{Debug, Formatter};

use tracing::{debug, info, warn};

use crate::config::RuntimeConfig;
use crate::errors::ErrorCode;
use crate::models::{ProcessIdentity, ProcessInfo, ProcessRole};
use crate::{AppError, Result};

use self::cr::CheckpointHook;
use self::filem::FileTransfer;
use self::grpcomm::GroupComm;
use self::iof::IoForwarder;
use self::plm::LaunchCoordinator;
use self::routed::Router;
use self::snapc::SnapshotCoordinator;
use self::transport::Transport;
use self::wait::WaitSubsystem;

/// What a module is told about the process when asked whether it can serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionQuery {
    /// Role of the selecting process.
    pub role: ProcessRole,
    /// Whether the selecting process is the head node.
    pub is_hnp: bool,
    /// Whether the selecting process takes part in the application side of
    /// the job. True for everything except daemons, the head node included.
    pub is_app: bool,
    /// Where forwarded I/O is collected, once routing has resolved it.
    pub collection_point: Option<ProcessIdentity>,
}

impl SelectionQuery {
    /// Build the query describing `info`.
    #[must_use]
    pub fn for_process(info: &ProcessInfo) -> Self {
        Self {
            role: info.role,
            is_hnp: info.is_hnp(),
            is_app: !info.is_daemon(),
            collection_point: info.hnp,
        }
    }
}

/// One pluggable implementation of a collaborator.
pub trait Module: Send {
    /// Module name, matched against configured include lists.
    fn name(&self) -> &str;

    /// Called when the framework opens. Returning `ErrorCode::NotAvailable`
    /// withdraws the module quietly; any other error fails the open.
    ///
    /// # Errors
    ///
    /// Module-specific.
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    /// Priority for serving `query`; `None` when the module cannot serve it.
    fn query(&self, query: &SelectionQuery) -> Option<i32>;

    /// Called once on the selected module.
    ///
    /// # Errors
    ///
    /// Module-specific; fails the selection.
    fn init(&mut self, _query: &SelectionQuery) -> Result<()> {
        Ok(())
    }

    /// Called when the framework closes.
    ///
    /// # Errors
    ///
    /// Module-specific.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Lifecycle of a [`Framework`] as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameworkState {
    /// Not opened, or closed again.
    Closed,
    /// Candidates opened, none selected yet.
    Opened,
    /// A module is active.
    Selected,
}

/// Candidate modules of one collaborator kind and the one selected among
/// them.
pub struct Framework<M: ?Sized> {
    kind: &'static str,
    include: Option<Vec<String>>,
    candidates: Vec<Box<M>>,
    selected: Option<Box<M>>,
    state: FrameworkState,
}

impl<M: ?Sized + Module> Framework<M> {
    /// Framework `kind` choosing among `candidates`.
    #[must_use]
    pub fn new(kind: &'static str, candidates: Vec<Box<M>>) -> Self {
        Self {
            kind,
            include: None,
            candidates,
            selected: None,
            state: FrameworkState::Closed,
        }
    }

    /// Restrict selection to the comma-separated module names in `include`.
    #[must_use]
    pub fn with_include(mut self, include: Option<&str>) -> Self {
        self.include = include.map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(ToOwned::to_owned)
                .collect()
        });
        self
    }

    /// Framework kind, e.g. `rml`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> FrameworkState {
        self.state
    }

    /// Open every candidate allowed by the include list.
    ///
    /// # Errors
    ///
    /// Returns the first candidate error other than `NotAvailable`, or
    /// `ErrorCode::NotFound` when no candidate remains. On error, candidates
    /// already opened are closed again and the framework stays `Closed`.
    pub fn open(&mut self) -> Result<()> {
        if let Some(include) = &self.include {
            self.candidates
                .retain(|module| include.iter().any(|name| name == module.name()));
        }

        let mut opened: Vec<Box<M>> = Vec::with_capacity(self.candidates.len());
        for mut module in self.candidates.drain(..) {
            match module.open() {
                Ok(()) => opened.push(module),
                Err(err) if err.code() == ErrorCode::NotAvailable => {
                    debug!(framework = self.kind, module = module.name(), "module not available");
                }
                Err(err) => {
                    for mut module in opened {
                        if let Err(close_err) = module.close() {
                            warn!(
                                framework = self.kind,
                                module = module.name(),
                                %close_err,
                                "close after failed open"
                            );
                        }
                    }
                    return Err(err);
                }
            }
        }
        self.candidates = opened;

        if self.candidates.is_empty() {
            return Err(AppError::component(
                ErrorCode::NotFound,
                format!("no {} module available", self.kind),
            ));
        }

        self.state = FrameworkState::Opened;
        Ok(())
    }

    /// Pick the highest-priority candidate for `query` and initialize it.
    /// Earlier candidates win ties. Unselected candidates are dropped.
    ///
    /// # Errors
    ///
    /// Returns `ErrorCode::Error` if the framework is not open,
    /// `ErrorCode::NotFound` if no candidate can serve `query`, or the
    /// winner's `init` error.
    pub fn select(&mut self, query: &SelectionQuery) -> Result<()> {
        if self.state != FrameworkState::Opened {
            return Err(AppError::component(
                ErrorCode::Error,
                format!("{} framework is not open", self.kind),
            ));
        }

        let mut best: Option<(usize, i32)> = None;
        for (index, module) in self.candidates.iter().enumerate() {
            if let Some(priority) = module.query(query) {
                if best.map_or(true, |(_, top)| priority > top) {
                    best = Some((index, priority));
                }
            }
        }

        let Some((index, priority)) = best else {
            return Err(AppError::component(
                ErrorCode::NotFound,
                format!("no {} module can serve this process", self.kind),
            ));
        };

        let mut module = self.candidates.swap_remove(index);
        module.init(query)?;
        info!(framework = self.kind, module = module.name(), priority, "module selected");

        self.candidates.clear();
        self.selected = Some(module);
        self.state = FrameworkState::Selected;
        Ok(())
    }

    /// The active module, if one has been selected.
    #[must_use]
    pub fn active(&self) -> Option<&M> {
        self.selected.as_deref()
    }

    /// Mutable access to the active module.
    ///
    /// # Errors
    ///
    /// Returns `ErrorCode::NotFound` when nothing is selected.
    pub fn active_mut(&mut self) -> Result<&mut M> {
        let kind = self.kind;
        self.selected.as_deref_mut().ok_or_else(|| {
            AppError::component(ErrorCode::NotFound, format!("no active {kind} module"))
        })
    }

    /// Close the active module and forget every candidate. The framework is
    /// `Closed` afterwards even when the module reports an error.
    ///
    /// # Errors
    ///
    /// Returns the active module's `close` error.
    pub fn close(&mut self) -> Result<()> {
        self.candidates.clear();
        self.state = FrameworkState::Closed;
        match self.selected.take() {
            Some(mut module) => module.close(),
            None => Ok(()),
        }
    }
}

impl<M: ?Sized + Module> Debug for Framework<M> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Framework")
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("selected", &self.active().map(Module::name))
            .field("candidates", &self.candidates.len())
            .finish()
    }
}

/// Every collaborator the environment setup service drives.
pub struct Collaborators {
    /// Messaging transport.
    pub rml: Framework<dyn Transport>,
    /// Routing resolver.
    pub routed: Framework<dyn Router>,
    /// Group communication.
    pub grpcomm: Framework<dyn GroupComm>,
    /// Process launch coordinator, already resolved for this role.
    pub plm: Box<dyn LaunchCoordinator>,
    /// I/O forwarding.
    pub iof: Framework<dyn IoForwarder>,
    /// Snapshot coordination; only opened with fault tolerance on.
    pub snapc: Framework<dyn SnapshotCoordinator>,
    /// File transfer.
    pub filem: Box<dyn FileTransfer>,
    /// Asynchronous wait subsystem.
    pub wait: Box<dyn WaitSubsystem>,
    /// Checkpoint/restart runtime hook, always initialized.
    pub cr: Box<dyn CheckpointHook>,
}

impl Collaborators {
    /// The built-in module set, honoring the include lists in `config`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the configured head node contact URI is
    /// malformed.
    pub fn builtin(config: &RuntimeConfig) -> Result<Self> {
        let components = &config.components;
        let hnp_uri = config
            .routing
            .hnp_uri
            .as_deref()
            .map(str::parse::<routed::ContactUri>)
            .transpose()?;

        Ok(Self {
            rml: transport::framework().with_include(components.rml.as_deref()),
            routed: routed::framework(hnp_uri).with_include(components.routed.as_deref()),
            grpcomm: grpcomm::framework().with_include(components.grpcomm.as_deref()),
            plm: plm::for_role(config.process.role),
            iof: iof::framework().with_include(components.iof.as_deref()),
            snapc: snapc::framework().with_include(components.snapc.as_deref()),
            filem: Box::new(filem::RawFileTransfer::default()),
            wait: Box::new(wait::EventWait::default()),
            cr: Box::new(cr::CrHook::default()),
        })
    }
}

impl Debug for Collaborators {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("rml", &self.rml)
            .field("routed", &self.routed)
            .field("grpcomm", &self.grpcomm)
            .field("plm", &self.plm.name())
            .field("iof", &self.iof)
            .field("snapc", &self.snapc)
            .finish_non_exhaustive()
    }
}
