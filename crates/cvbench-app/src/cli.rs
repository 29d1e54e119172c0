// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface and its merge into `HarnessConfig`.
//
// Precedence: built-in defaults, then the `--config` file, then flags.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use cvbench_core::config::{ErrorPolicy, HarnessConfig, VariantConfig};
use cvbench_core::error::Result;

/// Compare image-processing build variants task by task.
///
/// Prints two Markdown tables to stdout: first-run times and steady-state
/// averages, one row per task and one column per variant.
#[derive(Parser, Debug)]
#[command(name = "cvbench", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// JSON config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Input image shared by every task.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Discarded calls after the first run.
    #[arg(long)]
    pub warmup: Option<u32>,

    /// Recorded calls averaged into `avg`.
    #[arg(long)]
    pub repeat: Option<u32>,

    /// Add a subprocess variant, as `label=path/to/cvbench-native`.
    #[arg(long = "native", value_name = "LABEL=PATH", value_parser = parse_native)]
    pub natives: Vec<(String, PathBuf)>,

    /// Drop the configured variants and keep only `--native` ones.
    #[arg(long, requires = "natives")]
    pub native_only: bool,

    /// Only run these tasks (comma separated).
    #[arg(long, value_delimiter = ',')]
    pub tasks: Option<Vec<String>>,

    /// What to do when a cell fails.
    #[arg(long, value_enum)]
    pub on_error: Option<OnError>,

    /// Subprocess timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Also write the raw matrix as JSON.
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write the default configuration to a file.
    InitConfig {
        #[arg(default_value = "cvbench.json")]
        path: PathBuf,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnError {
    Abort,
    Na,
}

impl From<OnError> for ErrorPolicy {
    fn from(value: OnError) -> Self {
        match value {
            OnError::Abort => ErrorPolicy::Abort,
            OnError::Na => ErrorPolicy::Na,
        }
    }
}

fn parse_native(s: &str) -> std::result::Result<(String, PathBuf), String> {
    let (label, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected LABEL=PATH, got '{s}'"))?;
    if label.is_empty() || path.is_empty() {
        return Err(format!("expected LABEL=PATH, got '{s}'"));
    }
    Ok((label.to_string(), PathBuf::from(path)))
}

impl Cli {
    /// Resolve the effective configuration for a benchmark run.
    pub fn resolve_config(&self) -> Result<HarnessConfig> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::load(path)?,
            None => HarnessConfig::default(),
        };

        if let Some(input) = &self.input {
            config.input = input.clone();
        }
        if let Some(warmup) = self.warmup {
            config.warmup = warmup;
        }
        if let Some(repeat) = self.repeat {
            config.repeat = repeat;
        }
        if let Some(on_error) = self.on_error {
            config.on_error = on_error.into();
        }
        if let Some(secs) = self.timeout {
            config.subprocess_timeout_secs = secs;
        }
        if self.tasks.is_some() {
            config.tasks = self.tasks.clone();
        }

        if self.native_only {
            config.variants.clear();
        }
        config.variants.extend(
            self.natives
                .iter()
                .map(|(label, path)| VariantConfig::subprocess(label, path)),
        );

        config.validate()?;
        Ok(config)
    }
}
