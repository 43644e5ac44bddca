//! Supervisor side of the abort-marker protocol.
//!
//! A daemon that sees one of its application processes exit looks into the
//! process's session directory: an `abort` file means the exit was abnormal.
//! Reaping the directory afterwards is the cleanup the aborting process
//! deliberately skipped.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::models::{JobId, ProcessIdentity, Rank};
use crate::session_dir::{self, SessionPaths, ABORT_MARKER};
use crate::{AppError, Result};

/// How a process ended, judged from its session directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitKind {
    /// The process left an abort marker.
    Aborted,
    /// The directory exists without a marker.
    Normal,
    /// The directory is gone; the process finalized normally or was reaped.
    Vanished,
}

/// Classify the exit of the process owning `proc_dir`.
#[must_use]
pub fn classify_exit(proc_dir: &Path) -> ExitKind {
    if !proc_dir.is_dir() {
        ExitKind::Vanished
    } else if proc_dir.join(ABORT_MARKER).exists() {
        ExitKind::Aborted
    } else {
        ExitKind::Normal
    }
}

/// Classify, then remove the process's session directory, marker included.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be removed.
pub fn reap(paths: &SessionPaths) -> Result<ExitKind> {
    let kind = classify_exit(&paths.proc_dir);
    session_dir::remove(paths)?;
    info!(dir = %paths.proc_dir.display(), ?kind, "session directory reaped");
    Ok(kind)
}

/// Processes of `job` whose directory under `job_dir` holds an abort marker,
/// ordered by rank. Entries that are not rank directories are skipped.
///
/// # Errors
///
/// Returns an I/O error if `job_dir` cannot be read.
pub fn scan_job(job: JobId, job_dir: &Path) -> Result<Vec<ProcessIdentity>> {
    let entries = fs::read_dir(job_dir)
        .map_err(|err| AppError::io(&format!("cannot read {}", job_dir.display()), &err))?;

    let mut aborted: Vec<ProcessIdentity> = entries
        .flatten()
        .filter_map(|entry| {
            let rank = entry.file_name().to_str()?.parse::<u32>().ok()?;
            (classify_exit(&entry.path()) == ExitKind::Aborted).then_some(ProcessIdentity {
                job,
                rank: Rank(rank),
            })
        })
        .collect();
    aborted.sort_by_key(|name| name.rank);
    Ok(aborted)
}
