//! Runtime configuration parsing, validation, and environment overrides.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::components::routed::ContactUri;
use crate::models::{ProcessIdentity, ProcessInfo, ProcessRole};
use crate::session_dir;
use crate::{AppError, Result};

/// Identity and placement of this process.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ProcessConfig {
    /// Job this process belongs to; normally set by the launcher.
    #[serde(default)]
    pub job: Option<u32>,
    /// Rank within the job; normally set by the launcher.
    #[serde(default)]
    pub rank: Option<u32>,
    /// Role within the runtime.
    #[serde(default)]
    pub role: ProcessRole,
    /// Node name; the local host name when unset.
    #[serde(default)]
    pub nodename: Option<String>,
}

/// Session directory placement.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SessionConfig {
    /// Root for session directories; the system temp dir when unset.
    #[serde(default)]
    pub tmpdir_base: Option<PathBuf>,
}

/// Routing inputs.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct RoutingConfig {
    /// Head node contact, `job.rank;address`.
    #[serde(default)]
    pub hnp_uri: Option<String>,
}

/// Comma-separated include lists restricting module selection per framework.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ComponentConfig {
    /// Messaging transport modules.
    #[serde(default)]
    pub rml: Option<String>,
    /// Routing modules.
    #[serde(default)]
    pub routed: Option<String>,
    /// Group communication modules.
    #[serde(default)]
    pub grpcomm: Option<String>,
    /// I/O forwarding modules.
    #[serde(default)]
    pub iof: Option<String>,
    /// Snapshot coordinators.
    #[serde(default)]
    pub snapc: Option<String>,
}

/// Runtime configuration parsed from TOML.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct RuntimeConfig {
    /// Whether checkpoint/restart support is active.
    #[serde(default)]
    pub fault_tolerance: bool,
    /// Process identity and placement.
    #[serde(default)]
    pub process: ProcessConfig,
    /// Session directory placement.
    #[serde(default)]
    pub session: SessionConfig,
    /// Routing inputs.
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Module include lists.
    #[serde(default)]
    pub components: ComponentConfig,
}

impl RuntimeConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay values the launcher exported into the environment.
    ///
    /// Reads `ESS_JOBID`, `ESS_RANK`, `ESS_NODENAME`, `ESS_TMPDIR_BASE`,
    /// `ESS_HNP_URI` and `ESS_FAULT_TOLERANCE`. Unparsable values are logged
    /// and ignored. Callers run [`RuntimeConfig::validate`] once every
    /// override is in place.
    pub fn apply_env_overrides(&mut self) {
        if let Some(job) = env_parsed::<u32>("ESS_JOBID") {
            self.process.job = Some(job);
        }
        if let Some(rank) = env_parsed::<u32>("ESS_RANK") {
            self.process.rank = Some(rank);
        }
        if let Some(fault_tolerance) = env_parsed::<bool>("ESS_FAULT_TOLERANCE") {
            self.fault_tolerance = fault_tolerance;
        }
        if let Ok(nodename) = env::var("ESS_NODENAME") {
            if !nodename.trim().is_empty() {
                self.process.nodename = Some(nodename.trim().to_owned());
            }
        }
        if let Ok(base) = env::var("ESS_TMPDIR_BASE") {
            if !base.trim().is_empty() {
                self.session.tmpdir_base = Some(PathBuf::from(base.trim()));
            }
        }
        if let Ok(uri) = env::var("ESS_HNP_URI") {
            match uri.parse::<ContactUri>() {
                Ok(_) => self.routing.hnp_uri = Some(uri),
                Err(err) => warn!(%err, "ignoring ESS_HNP_URI"),
            }
        }
    }

    /// This process's identity; unset fields come back as the invalid
    /// sentinels and are rejected when the session directory is named.
    #[must_use]
    pub fn identity(&self) -> ProcessIdentity {
        let mut name = ProcessIdentity::INVALID;
        if let Some(job) = self.process.job {
            name.job.0 = job;
        }
        if let Some(rank) = self.process.rank {
            name.rank.0 = rank;
        }
        name
    }

    /// Build the process-wide information this configuration describes.
    #[must_use]
    pub fn process_info(&self) -> ProcessInfo {
        let nodename = self
            .process
            .nodename
            .clone()
            .unwrap_or_else(session_dir::local_hostname);
        let mut info = ProcessInfo::new(self.identity(), self.process.role, nodename);
        info.tmpdir_base.clone_from(&self.session.tmpdir_base);
        info
    }

    /// Check the configuration as it stands, overrides included.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for a malformed head node contact URI, a
    /// relative tmpdir base, or a node name that is empty or contains a path
    /// separator.
    pub fn validate(&self) -> Result<()> {
        if let Some(uri) = &self.routing.hnp_uri {
            uri.parse::<ContactUri>()
                .map_err(|err| AppError::Config(format!("routing.hnp_uri invalid: {err}")))?;
        }

        if let Some(base) = &self.session.tmpdir_base {
            if !base.is_absolute() {
                return Err(AppError::Config(format!(
                    "session.tmpdir_base must be absolute, got {}",
                    base.display()
                )));
            }
        }

        if let Some(nodename) = &self.process.nodename {
            if nodename.trim().is_empty() || nodename.contains(['/', '\\']) {
                return Err(AppError::Config(
                    "process.nodename must be a non-empty name without path separators".into(),
                ));
            }
        }

        Ok(())
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, value = %raw, %err, "ignoring unparsable environment override");
            None
        }
    }
}
