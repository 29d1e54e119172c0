// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// cvbench — entry point.
//
// Initialises logging (stderr), resolves the configuration, brings up every
// variant, measures the task x variant matrix and prints the `firstRun` and
// `avg` tables to stdout. Any aborted run exits with status 1.

mod cli;
mod report;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use cvbench_core::config::HarnessConfig;
use cvbench_core::error::{BenchError, Result};
use cvbench_harness::{Task, initialize_variants, render_report, run_benchmark};
use cvbench_imgproc::SourceImage;

use cli::{Cli, Command};
use report::RunReport;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match &cli.command {
        Some(Command::InitConfig { path, force }) => init_config(path, *force),
        None => run(&cli).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "cvbench failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let config = cli.resolve_config()?;
    let params = config.measure_params()?;
    let tasks = Task::selection(config.tasks.as_deref())?;

    info!("cvbench starting");
    let source = SourceImage::open(&config.input)?;
    let variants = initialize_variants(&config).await?;

    let matrix = run_benchmark(&tasks, &variants, &source, params, config.on_error).await?;

    if let Some(path) = &cli.json {
        RunReport::new(&config, matrix.clone()).write(path)?;
    }
    print!("{}", render_report(&matrix));
    Ok(())
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(BenchError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    HarnessConfig::default().save(path)?;
    info!(path = %path.display(), "Default config written");
    Ok(())
}
