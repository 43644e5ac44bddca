//! Routing resolver: decides which process a message is relayed through and
//! resolves the head node and local daemon for this process.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::mpsc::Receiver;

use tracing::{debug, info};

use super::{Framework, Module, SelectionQuery};
use crate::errors::ErrorCode;
use crate::models::{JobId, ProcessIdentity};
use crate::{AppError, Result};

/// Identities resolved by `init_routes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteInfo {
    /// Head node process, which is also the I/O collection point.
    pub hnp: ProcessIdentity,
    /// Daemon that relays this process's traffic.
    pub daemon: ProcessIdentity,
}

/// Contact information for one process: `job.rank;address`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactUri {
    /// Process the address belongs to.
    pub name: ProcessIdentity,
    /// Transport-specific address.
    pub address: String,
}

impl FromStr for ContactUri {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let (name, address) = s
            .split_once(';')
            .ok_or_else(|| AppError::Config(format!("contact uri `{s}` lacks an address")))?;
        if address.trim().is_empty() {
            return Err(AppError::Config(format!("contact uri `{s}` has an empty address")));
        }
        Ok(Self {
            name: name.parse()?,
            address: address.trim().to_owned(),
        })
    }
}

impl Display for ContactUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{};{}", self.name.job, self.name.rank, self.address)
    }
}

/// Operations the runtime needs from the active routing module.
pub trait Router: Module {
    /// Set up routes for `job`.
    ///
    /// Depending on the module this returns as soon as the head node's
    /// contact information is known, or blocks until contact information for
    /// the whole job has arrived. Callers must not assume it returns promptly;
    /// no timeout is applied.
    ///
    /// # Errors
    ///
    /// Module-specific; typically `ErrorCode::NotFound` when the head node
    /// cannot be resolved.
    fn init_routes(&mut self, job: JobId, peers: Option<&[ProcessIdentity]>) -> Result<RouteInfo>;

    /// Next hop towards `target`, once routes are initialized.
    fn route(&self, target: &ProcessIdentity) -> Option<ProcessIdentity>;
}

/// Routes every message straight to its destination. Resolves the head node
/// from configured contact information and returns immediately.
#[derive(Debug, Default)]
pub struct DirectRouter {
    hnp_uri: Option<ContactUri>,
    resolved: Option<RouteInfo>,
}

impl DirectRouter {
    /// Router that knows the head node through `hnp_uri`.
    #[must_use]
    pub fn new(hnp_uri: Option<ContactUri>) -> Self {
        Self {
            hnp_uri,
            resolved: None,
        }
    }
}

impl Module for DirectRouter {
    fn name(&self) -> &str {
        "direct"
    }

    fn query(&self, _query: &SelectionQuery) -> Option<i32> {
        Some(10)
    }

    fn close(&mut self) -> Result<()> {
        self.resolved = None;
        Ok(())
    }
}

impl Router for DirectRouter {
    fn init_routes(&mut self, job: JobId, peers: Option<&[ProcessIdentity]>) -> Result<RouteInfo> {
        let uri = self.hnp_uri.as_ref().ok_or_else(|| {
            AppError::component(
                ErrorCode::NotFound,
                "no contact information for the head node process",
            )
        })?;

        let info = RouteInfo {
            hnp: uri.name,
            daemon: uri.name,
        };
        debug!(
            %job,
            hnp = %uri,
            peers = peers.map_or(0, <[ProcessIdentity]>::len),
            "direct routes initialized"
        );
        self.resolved = Some(info);
        Ok(info)
    }

    fn route(&self, target: &ProcessIdentity) -> Option<ProcessIdentity> {
        self.resolved.map(|_| *target)
    }
}

/// Blocks in `init_routes` until the job's full contact table arrives on a
/// channel, then routes directly to every known peer and through the head
/// node for everyone else.
///
/// Library-only: [`framework`] does not register it and no configuration key
/// selects it, so `ess-app` never runs it. Embedders that own a contact
/// channel build a `Framework<dyn Router>` with it themselves.
#[derive(Debug)]
pub struct ExchangeRouter {
    contacts: Option<Receiver<Vec<ContactUri>>>,
    table: HashMap<ProcessIdentity, String>,
    hnp: Option<ProcessIdentity>,
}

impl ExchangeRouter {
    /// Router fed by `contacts`.
    #[must_use]
    pub fn new(contacts: Receiver<Vec<ContactUri>>) -> Self {
        Self {
            contacts: Some(contacts),
            table: HashMap::new(),
            hnp: None,
        }
    }

    /// Address recorded for `name`.
    #[must_use]
    pub fn address_of(&self, name: &ProcessIdentity) -> Option<&str> {
        self.table.get(name).map(String::as_str)
    }
}

impl Module for ExchangeRouter {
    fn name(&self) -> &str {
        "exchange"
    }

    fn query(&self, _query: &SelectionQuery) -> Option<i32> {
        Some(5)
    }

    fn close(&mut self) -> Result<()> {
        self.contacts = None;
        self.table.clear();
        self.hnp = None;
        Ok(())
    }
}

impl Router for ExchangeRouter {
    fn init_routes(&mut self, job: JobId, peers: Option<&[ProcessIdentity]>) -> Result<RouteInfo> {
        let contacts = self.contacts.take().ok_or_else(|| {
            AppError::component(ErrorCode::Error, "contact exchange already consumed")
        })?;

        debug!(%job, "waiting for job contact table");
        let table = contacts.recv().map_err(|_| {
            AppError::component(
                ErrorCode::Unreachable,
                "contact exchange closed before delivering the job table",
            )
        })?;

        self.table = table
            .into_iter()
            .map(|contact| (contact.name, contact.address))
            .collect();

        if let Some(missing) = peers
            .unwrap_or_default()
            .iter()
            .find(|peer| !self.table.contains_key(peer))
        {
            return Err(AppError::component(
                ErrorCode::NotFound,
                format!("no contact information for peer {missing}"),
            ));
        }

        let hnp = ProcessIdentity::hnp();
        if !self.table.contains_key(&hnp) {
            return Err(AppError::component(
                ErrorCode::NotFound,
                "contact table lacks the head node process",
            ));
        }
        self.hnp = Some(hnp);

        info!(%job, contacts = self.table.len(), "exchange routes initialized");
        Ok(RouteInfo { hnp, daemon: hnp })
    }

    fn route(&self, target: &ProcessIdentity) -> Option<ProcessIdentity> {
        let hnp = self.hnp?;
        if self.table.contains_key(target) {
            Some(*target)
        } else {
            Some(hnp)
        }
    }
}

/// Framework holding the built-in routing modules. Only the direct router is
/// registered by default; the exchange router needs a contact channel and is
/// added by callers that have one.
#[must_use]
pub fn framework(hnp_uri: Option<ContactUri>) -> Framework<dyn Router> {
    Framework::new("routed", vec![Box::new(DirectRouter::new(hnp_uri))])
}
