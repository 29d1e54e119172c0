// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for cvbench.

use std::time::Duration;

use thiserror::Error;

/// Top-level error type for all cvbench operations.
///
/// None of these are retried. A failing (task, variant) cell either aborts the
/// run or is recorded as unavailable, depending on the configured policy.
#[derive(Debug, Error)]
pub enum BenchError {
    // -- Measurement protocol --
    #[error("invalid measurement parameters: {0}")]
    InvalidParams(String),

    #[error("setup for task '{task}' failed: {reason}")]
    Setup { task: String, reason: String },

    #[error("operation '{op}' failed: {reason}")]
    Operation { op: &'static str, reason: String },

    #[error("unknown task: {0}")]
    UnknownTask(String),

    // -- Subprocess variants --
    #[error("failed to launch {executable}: {reason}")]
    SubprocessSpawn { executable: String, reason: String },

    #[error("subprocess exited with {status}: {stderr}")]
    SubprocessFailed { status: String, stderr: String },

    #[error("subprocess timed out after {}ms", .timeout.as_millis())]
    SubprocessTimeout { timeout: Duration },

    #[error("subprocess reported an invalid sample: {0}")]
    InvalidSample(String),

    // -- Inputs / configuration --
    #[error("image load failed: {0}")]
    ImageLoad(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BenchError>;

impl BenchError {
    /// Shorthand for a failed library operation.
    pub fn op(op: &'static str, reason: impl Into<String>) -> Self {
        Self::Operation {
            op,
            reason: reason.into(),
        }
    }

    /// Shorthand for a failed per-cell setup step.
    pub fn setup(task: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Setup {
            task: task.into(),
            reason: reason.into(),
        }
    }
}
