use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lcftrans_core::cli::{report, Cli};
use lcftrans_core::services::workflow;
use lcftrans_core::Error;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli.into_config().context("invalid arguments")?;
    let mode = config.mode;

    let report = workflow::run(&config)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    report::print(&mut out, mode, &report)?;
    out.flush()?;

    if report.failed() > 0 {
        tracing::warn!(event = "run_incomplete", failed = report.failed());
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    init_tracing();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("lcftrans: {e:#}");
            match e.downcast_ref::<Error>() {
                Some(Error::UnknownEncoding(_)) => ExitCode::from(3),
                _ => ExitCode::from(1),
            }
        }
    }
}
