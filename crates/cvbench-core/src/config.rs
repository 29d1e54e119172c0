// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Harness configuration, loadable from a JSON file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};
use crate::types::MeasureParams;

/// How a failing (task, variant) cell is handled. Applied uniformly to every
/// cell of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop the whole run at the first failing cell.
    #[default]
    Abort,
    /// Record the cell as unavailable and render it as `N/A`.
    Na,
}

/// Build flavour of a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantKind {
    /// In-process, single-threaded library build.
    Scalar,
    /// In-process build that fans per-channel work out over a thread pool.
    Threaded,
    /// Out-of-process executable speaking the `<task> <input>` protocol.
    Subprocess,
}

/// One column of the comparison matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantConfig {
    /// Column label, e.g. `scalar` or `opt3`.
    pub label: String,
    pub kind: VariantKind,
    /// Executable path, required for subprocess variants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,
}

impl VariantConfig {
    pub fn in_process(label: impl Into<String>, kind: VariantKind) -> Self {
        Self {
            label: label.into(),
            kind,
            executable: None,
        }
    }

    pub fn subprocess(label: impl Into<String>, executable: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            kind: VariantKind::Subprocess,
            executable: Some(executable.into()),
        }
    }
}

/// Settings for one benchmark run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Image every task reads (decoded once, shared read-only).
    pub input: PathBuf,
    /// Discarded calls after the first run.
    pub warmup: u32,
    /// Recorded calls averaged into `avg`.
    pub repeat: u32,
    /// Failure handling for individual cells.
    pub on_error: ErrorPolicy,
    /// Upper bound for a single subprocess call, in seconds.
    pub subprocess_timeout_secs: u64,
    /// Matrix columns, in display order.
    pub variants: Vec<VariantConfig>,
    /// Restrict the run to these task names (catalog order is kept).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<String>>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("flower.jpg"),
            warmup: MeasureParams::DEFAULT_WARMUP,
            repeat: MeasureParams::DEFAULT_REPEAT,
            on_error: ErrorPolicy::Abort,
            subprocess_timeout_secs: 120,
            variants: vec![
                VariantConfig::in_process("scalar", VariantKind::Scalar),
                VariantConfig::in_process("threaded", VariantKind::Threaded),
            ],
            tasks: None,
        }
    }
}

impl HarnessConfig {
    /// Read a JSON config file. Missing fields fall back to defaults.
    ///
    /// The result is not validated: command-line overrides may still fix it,
    /// so callers run [`HarnessConfig::validate`] once everything is merged.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Write the config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), text)?;
        Ok(())
    }

    /// Protocol parameters; fails when `repeat` is zero.
    pub fn measure_params(&self) -> Result<MeasureParams> {
        MeasureParams::new(self.warmup, self.repeat)
    }

    pub fn subprocess_timeout(&self) -> Duration {
        Duration::from_secs(self.subprocess_timeout_secs)
    }

    /// Reject configurations that could only produce a malformed table.
    pub fn validate(&self) -> Result<()> {
        self.measure_params()?;

        if self.variants.is_empty() {
            return Err(BenchError::Config("at least one variant is required".into()));
        }
        if self.subprocess_timeout_secs == 0 {
            return Err(BenchError::Config(
                "subprocess_timeout_secs must be positive".into(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for variant in &self.variants {
            if !seen.insert(variant.label.as_str()) {
                return Err(BenchError::Config(format!(
                    "duplicate variant label '{}'",
                    variant.label
                )));
            }
            if variant.kind == VariantKind::Subprocess && variant.executable.is_none() {
                return Err(BenchError::Config(format!(
                    "subprocess variant '{}' has no executable",
                    variant.label
                )));
            }
        }
        Ok(())
    }
}
