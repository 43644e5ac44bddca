//! Per-process session directories.
//!
//! Layout: `<tmp_root>/ess-sessions-<user>@<host>/<job>/<rank>`. The proc
//! directory holds the redirected diagnostic output and, after a reported
//! abnormal termination, the `abort` marker.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::ErrorCode;
use crate::{AppError, Result};

/// Name of the zero-byte marker dropped by a reported abort.
pub const ABORT_MARKER: &str = "abort";

/// Prefix of the top-level session directory.
const TOP_DIR_PREFIX: &str = "ess-sessions-";

/// The three directory levels owned by one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPaths {
    /// Per-user, per-host root shared by every job on the node.
    pub top_dir: PathBuf,
    /// Per-job directory.
    pub job_dir: PathBuf,
    /// Per-process directory.
    pub proc_dir: PathBuf,
}

impl SessionPaths {
    /// Compute the session directories without touching the file system.
    #[must_use]
    pub fn compute(tmp_root: Option<&Path>, hostname: &str, user: &str, job: &str, rank: &str) -> Self {
        let root = tmp_root.map_or_else(std::env::temp_dir, Path::to_path_buf);
        let top_dir = root.join(format!("{TOP_DIR_PREFIX}{user}@{hostname}"));
        let job_dir = top_dir.join(job);
        let proc_dir = job_dir.join(rank);
        Self {
            top_dir,
            job_dir,
            proc_dir,
        }
    }

    /// Location of the abort marker inside the proc directory.
    #[must_use]
    pub fn abort_marker(&self) -> PathBuf {
        self.proc_dir.join(ABORT_MARKER)
    }
}

/// Create (or, with `create_if_missing == false`, verify) the session
/// directories for one process.
///
/// # Errors
///
/// Returns `ErrorCode::NotFound` when the directory is absent and may not be
/// created, or an I/O error when creation fails or the path is not a
/// directory.
pub fn create(
    create_if_missing: bool,
    tmp_root: Option<&Path>,
    hostname: &str,
    job: &str,
    rank: &str,
) -> Result<SessionPaths> {
    let paths = SessionPaths::compute(tmp_root, hostname, &current_user(), job, rank);

    if paths.proc_dir.is_dir() {
        debug!(dir = %paths.proc_dir.display(), "session directory already present");
        return Ok(paths);
    }

    if !create_if_missing {
        return Err(AppError::component(
            ErrorCode::NotFound,
            format!("session directory {} does not exist", paths.proc_dir.display()),
        ));
    }

    make_private_dir(&paths.proc_dir).map_err(|err| {
        AppError::io(
            &format!("failed to create session directory {}", paths.proc_dir.display()),
            &err,
        )
    })?;

    if !paths.proc_dir.is_dir() {
        return Err(AppError::component(
            ErrorCode::FileOpenFailure,
            format!("{} is not a directory", paths.proc_dir.display()),
        ));
    }

    Ok(paths)
}

/// Remove the proc directory recursively, then the job and top directories
/// when nothing else lives in them.
///
/// # Errors
///
/// Returns an I/O error if the proc directory exists but cannot be removed.
/// Non-empty parents are left in place silently.
pub fn remove(paths: &SessionPaths) -> Result<()> {
    match fs::remove_dir_all(&paths.proc_dir) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(AppError::io(
                &format!("failed to remove {}", paths.proc_dir.display()),
                &err,
            ))
        }
    }

    for parent in [&paths.job_dir, &paths.top_dir] {
        if let Err(err) = fs::remove_dir(parent) {
            debug!(dir = %parent.display(), %err, "session parent left in place");
            break;
        }
    }

    Ok(())
}

/// Login name used to scope the top-level session directory.
#[must_use]
pub fn current_user() -> String {
    #[cfg(unix)]
    {
        let uid = nix::unistd::getuid();
        match nix::unistd::User::from_uid(uid) {
            Ok(Some(user)) => return user.name,
            Ok(None) => return uid.to_string(),
            Err(err) => warn!(%err, "user lookup failed, falling back to environment"),
        }
    }

    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".into())
}

/// Host name of the local node.
#[must_use]
pub fn local_hostname() -> String {
    #[cfg(unix)]
    {
        match nix::unistd::gethostname() {
            Ok(name) => return name.to_string_lossy().into_owned(),
            Err(err) => warn!(%err, "gethostname failed, falling back to environment"),
        }
    }

    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "localhost".into())
}

#[cfg(unix)]
fn make_private_dir(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    fs::DirBuilder::new().recursive(true).mode(0o700).create(path)
}

#[cfg(not(unix))]
fn make_private_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path)
}
