// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JSON export of a finished run.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use cvbench_core::config::{ErrorPolicy, HarnessConfig};
use cvbench_core::error::Result;
use cvbench_core::types::ComparisonMatrix;

/// One run's raw results plus the settings they were measured under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub input: PathBuf,
    pub warmup: u32,
    pub repeat: u32,
    pub on_error: ErrorPolicy,
    pub matrix: ComparisonMatrix,
}

impl RunReport {
    pub fn new(config: &HarnessConfig, matrix: ComparisonMatrix) -> Self {
        Self {
            generated_at: Utc::now(),
            input: config.input.clone(),
            warmup: config.warmup,
            repeat: config.repeat,
            on_error: config.on_error,
            matrix,
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Report written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvbench_core::types::{ResultRow, TimingSummary};

    #[test]
    fn written_report_reads_back() {
        let mut matrix = ComparisonMatrix::new(vec!["scalar".into()]);
        matrix.push(ResultRow {
            task_name: "blur".into(),
            summaries: vec![Some(TimingSummary { first_run: 4.0, avg: 3.5 })],
        });
        let report = RunReport::new(&HarnessConfig::default(), matrix.clone());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        report.write(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let back: RunReport = serde_json::from_str(&text).unwrap();
        assert_eq!(back.matrix, matrix);
        assert_eq!(back.repeat, 5);
        assert_eq!(back.generated_at, report.generated_at);
    }
}
