#![forbid(unsafe_code)]

//! `ess-ctl`: supervisor-side companion for `ess-app`.
//!
//! Inspects session directories for abort markers and reaps directories
//! that aborting processes left behind.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use ess_runtime::models::{JobId, ProcessIdentity};
use ess_runtime::session_dir::{self, SessionPaths};
use ess_runtime::supervisor::{self, ExitKind};

#[derive(Debug, Parser)]
#[command(
    name = "ess-ctl",
    about = "Inspect and reap runtime session directories",
    version,
    long_about = None
)]
struct Cli {
    /// Session directory root; the system temp dir when omitted.
    #[arg(long)]
    tmpdir: Option<PathBuf>,

    /// Node name the sessions belong to; the local host when omitted.
    #[arg(long)]
    host: Option<String>,

    /// User owning the sessions; the current user when omitted.
    #[arg(long)]
    user: Option<String>,

    /// Print results as JSON.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Report how one process ended.
    Status {
        /// Job id.
        #[arg(long)]
        job: u32,
        /// Rank within the job.
        #[arg(long)]
        rank: u32,
    },

    /// Report how one process ended, then remove its session directory.
    Reap {
        /// Job id.
        #[arg(long)]
        job: u32,
        /// Rank within the job.
        #[arg(long)]
        rank: u32,
    },

    /// List the ranks of a job that left an abort marker.
    Scan {
        /// Job id.
        #[arg(long)]
        job: u32,
    },
}

impl Cli {
    fn paths(&self, job: &str, rank: &str) -> SessionPaths {
        let host = self.host.clone().unwrap_or_else(session_dir::local_hostname);
        let user = self.user.clone().unwrap_or_else(session_dir::current_user);
        SessionPaths::compute(self.tmpdir.as_deref(), &host, &user, job, rank)
    }
}

fn main() {
    let args = Cli::parse();

    let result = match &args.command {
        Command::Status { job, rank } => {
            let paths = args.paths(&job.to_string(), &rank.to_string());
            let kind = supervisor::classify_exit(&paths.proc_dir);
            Ok(report_kind(&args, ProcessIdentity::new(*job, *rank), kind))
        }
        Command::Reap { job, rank } => {
            let paths = args.paths(&job.to_string(), &rank.to_string());
            supervisor::reap(&paths)
                .map(|kind| report_kind(&args, ProcessIdentity::new(*job, *rank), kind))
        }
        Command::Scan { job } => {
            let paths = args.paths(&job.to_string(), "0");
            supervisor::scan_job(JobId(*job), &paths.job_dir).map(|aborted| {
                if args.json {
                    serde_json::json!({ "job": job, "aborted": aborted }).to_string()
                } else if aborted.is_empty() {
                    format!("job {job}: no aborted processes")
                } else {
                    let names: Vec<String> = aborted.iter().map(ToString::to_string).collect();
                    format!("job {job}: aborted {}", names.join(" "))
                }
            })
        }
    };

    match result {
        Ok(line) => println!("{line}"),
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}

fn report_kind(args: &Cli, name: ProcessIdentity, kind: ExitKind) -> String {
    if args.json {
        serde_json::json!({ "name": name, "exit": kind }).to_string()
    } else {
        let label = match kind {
            ExitKind::Aborted => "aborted",
            ExitKind::Normal => "no abort marker",
            ExitKind::Vanished => "no session directory",
        };
        format!("{name}: {label}")
    }
}
