// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Invocation styles behind `call() -> milliseconds`.
//
//   - Direct:     time an in-process library call with a monotonic clock.
//   - Subprocess: run `<executable> <task> <input>` and read the duration the
//                 child reports on stdout.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{debug, error, instrument};

use cvbench_core::error::{BenchError, Result};
use cvbench_core::types::TimingSample;

/// Run `op` once and return its wall-clock duration in fractional
/// milliseconds. Only `op` itself sits between the two clock reads.
pub fn timed<F>(op: F) -> Result<TimingSample>
where
    F: FnOnce() -> Result<()>,
{
    let start = Instant::now();
    op()?;
    let elapsed = start.elapsed();
    Ok(elapsed.as_secs_f64() * 1000.0)
}

/// Parse the duration a subprocess printed.
///
/// Surrounding whitespace is ignored. Anything that is not a finite,
/// non-negative number is rejected.
pub fn parse_sample(stdout: &str) -> Result<TimingSample> {
    let text = stdout.trim();
    let value: f64 = text
        .parse()
        .map_err(|_| BenchError::InvalidSample(format!("'{text}' is not a number")))?;
    if !value.is_finite() || value < 0.0 {
        return Err(BenchError::InvalidSample(format!(
            "'{text}' is not a non-negative duration"
        )));
    }
    Ok(value)
}

/// An out-of-process variant: an executable speaking the
/// `<task> <input>` protocol.
#[derive(Debug, Clone)]
pub struct SubprocessSpec {
    pub executable: PathBuf,
    /// Upper bound for one invocation, spawn to exit.
    pub timeout: Duration,
}

impl SubprocessSpec {
    pub fn new(executable: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            executable: executable.into(),
            timeout,
        }
    }

    /// Run the executable once for `task` on `input`.
    ///
    /// The harness does not time the child; the returned sample is whatever
    /// the child printed. On a non-zero exit the child's stderr is logged and
    /// carried in the error.
    #[instrument(skip(self, input), fields(exe = %self.executable.display()))]
    pub async fn call(&self, task: &str, input: &Path) -> Result<TimingSample> {
        let exe = self.executable.display().to_string();
        let child = Command::new(&self.executable)
            .arg(task)
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BenchError::SubprocessSpawn {
                executable: exe.clone(),
                reason: e.to_string(),
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| BenchError::SubprocessTimeout {
                timeout: self.timeout,
            })?
            .map_err(|e| BenchError::SubprocessSpawn {
                executable: exe.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
            error!(status = %output.status, stderr = %stderr, "subprocess failed");
            return Err(BenchError::SubprocessFailed {
                status: output.status.to_string(),
                stderr,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let sample = parse_sample(&stdout)?;
        debug!(sample, "subprocess reported");
        Ok(sample)
    }
}
