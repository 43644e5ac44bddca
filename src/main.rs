#![forbid(unsafe_code)]

//! `ess-app`: runs one application process through the environment setup
//! service.
//!
//! Loads configuration, starts the runtime, then either waits for SIGINT or
//! SIGTERM and finalizes, finalizes straight away, or aborts on request.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use ess_runtime::components::Collaborators;
use ess_runtime::diagnostics::{DiagnosticOutput, StderrHelp};
use ess_runtime::models::ProcessRole;
use ess_runtime::{AppError, AppEss, Result, RuntimeConfig, RuntimeContext};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "ess-app", about = "Application process runtime bootstrap", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the job id.
    #[arg(long)]
    job: Option<u32>,

    /// Override the rank within the job.
    #[arg(long)]
    rank: Option<u32>,

    /// Override the process role.
    #[arg(long, value_enum)]
    role: Option<ProcessRole>,

    /// Override the session directory root.
    #[arg(long)]
    tmpdir: Option<PathBuf>,

    /// Override the head node contact, `job.rank;address`.
    #[arg(long)]
    hnp_uri: Option<String>,

    /// Finalize right after startup instead of waiting for a signal.
    #[arg(long)]
    exit_after_startup: bool,

    /// Abort with this status right after startup.
    #[arg(long, allow_negative_numbers = true)]
    abort: Option<i32>,

    /// With `--abort`, leave no abort marker behind.
    #[arg(long, requires = "abort")]
    no_report: bool,
}

fn main() {
    let args = Cli::parse();
    let output = DiagnosticOutput::new();
    if let Err(err) = init_tracing(args.log_format, output.clone()) {
        eprintln!("ess-app: {err}");
        std::process::exit(1);
    }
    info!("ess-app bootstrap");

    if let Err(err) = run(&args, output) {
        error!(%err, "ess-app failed");
        std::process::exit(err.code().value());
    }
}

fn run(args: &Cli, output: DiagnosticOutput) -> Result<()> {
    let config = load_config(args)?;
    let components = Collaborators::builtin(&config)?;
    let mut ctx = RuntimeContext::new(
        config.process_info(),
        config.fault_tolerance,
        output,
        Box::new(StderrHelp),
    );
    let mut ess = AppEss::new(components);

    // A half-started runtime is torn down through the abort path.
    if let Err(err) = ess.startup(&mut ctx) {
        ess.abort(&mut ctx, err.code().value(), true);
    }

    if let Some(status) = args.abort {
        info!(status, report = !args.no_report, "abort requested");
        ess.abort(&mut ctx, status, !args.no_report);
    }

    if !args.exit_after_startup {
        wait_for_shutdown()?;
        info!("shutdown signal received");
    }

    ess.finalize(&mut ctx)?;
    info!("ess-app shut down");
    Ok(())
}

fn load_config(args: &Cli) -> Result<RuntimeConfig> {
    let mut config = match &args.config {
        Some(path) => RuntimeConfig::load_from_path(path)?,
        None => RuntimeConfig::default(),
    };
    config.apply_env_overrides();

    if let Some(job) = args.job {
        config.process.job = Some(job);
    }
    if let Some(rank) = args.rank {
        config.process.rank = Some(rank);
    }
    if let Some(role) = args.role {
        config.process.role = role;
    }
    if let Some(tmpdir) = &args.tmpdir {
        config.session.tmpdir_base = Some(tmpdir.clone());
    }
    if let Some(uri) = &args.hnp_uri {
        config.routing.hnp_uri = Some(uri.clone());
    }
    config.validate()?;

    info!(name = %config.identity(), role = ?config.process.role, "configuration loaded");
    Ok(config)
}

fn wait_for_shutdown() -> Result<()> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(shutdown_signal());
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat, output: DiagnosticOutput) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(output);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
