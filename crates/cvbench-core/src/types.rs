// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: timing samples, summaries, result rows and the derived
// comparison tables.

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};

/// A single measured duration in fractional milliseconds.
pub type TimingSample = f64;

/// Label of the first column of every comparison table.
pub const TASK_COLUMN: &str = "task";

/// Decimal places used for every rendered duration.
pub const DISPLAY_PRECISION: usize = 3;

/// Cell text used when a cell failed under the `na` error policy.
pub const UNAVAILABLE_CELL: &str = "N/A";

/// Warmup and repeat counts for the measurement protocol.
///
/// Deserialisation goes through [`MeasureParams::new`], so a stored
/// `repeat` of 0 is rejected the same way as a constructed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMeasureParams")]
pub struct MeasureParams {
    warmup: u32,
    repeat: u32,
}

#[derive(Deserialize)]
struct RawMeasureParams {
    warmup: u32,
    repeat: u32,
}

impl TryFrom<RawMeasureParams> for MeasureParams {
    type Error = BenchError;

    fn try_from(raw: RawMeasureParams) -> Result<Self> {
        Self::new(raw.warmup, raw.repeat)
    }
}

impl MeasureParams {
    pub const DEFAULT_WARMUP: u32 = 3;
    pub const DEFAULT_REPEAT: u32 = 5;

    /// Build protocol parameters. `repeat` must be at least 1, otherwise the
    /// steady-state average would be undefined.
    pub fn new(warmup: u32, repeat: u32) -> Result<Self> {
        if repeat == 0 {
            return Err(BenchError::InvalidParams(
                "repeat must be at least 1".into(),
            ));
        }
        Ok(Self { warmup, repeat })
    }

    pub fn warmup(&self) -> u32 {
        self.warmup
    }

    pub fn repeat(&self) -> u32 {
        self.repeat
    }

    /// Total number of calls one measurement performs.
    pub fn total_calls(&self) -> u64 {
        1 + self.warmup as u64 + self.repeat as u64
    }
}

impl Default for MeasureParams {
    fn default() -> Self {
        Self {
            warmup: Self::DEFAULT_WARMUP,
            repeat: Self::DEFAULT_REPEAT,
        }
    }
}

/// Result of measuring one (task, variant) cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingSummary {
    /// Duration of the very first call (cold path).
    pub first_run: TimingSample,
    /// Mean of the `repeat` calls taken after warmup.
    pub avg: TimingSample,
}

impl TimingSummary {
    /// Project one of the two figures out of the summary.
    pub fn get(&self, metric: Metric) -> TimingSample {
        match metric {
            Metric::FirstRun => self.first_run,
            Metric::Avg => self.avg,
        }
    }
}

/// Which figure of a [`TimingSummary`] a table shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    FirstRun,
    Avg,
}

impl Metric {
    /// Heading printed above the rendered table.
    pub fn heading(&self) -> &'static str {
        match self {
            Self::FirstRun => "firstRun",
            Self::Avg => "avg",
        }
    }
}

/// All measurements for one task, one entry per variant in declaration order.
///
/// `None` marks a cell that failed under the `na` error policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub task_name: String,
    pub summaries: Vec<Option<TimingSummary>>,
}

/// Every row of a run together with the variant labels it was measured on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonMatrix {
    /// Variant labels, in declaration order.
    pub variants: Vec<String>,
    /// Rows in task catalog order.
    pub rows: Vec<ResultRow>,
}

impl ComparisonMatrix {
    pub fn new(variants: Vec<String>) -> Self {
        Self {
            variants,
            rows: Vec::new(),
        }
    }

    /// Append a completed row. Rows are never modified once pushed.
    pub fn push(&mut self, row: ResultRow) {
        self.rows.push(row);
    }

    /// Derive the table for one metric. Row and column order are taken
    /// verbatim from the matrix.
    pub fn table(&self, metric: Metric) -> ComparisonTable {
        let mut header = Vec::with_capacity(self.variants.len() + 1);
        header.push(TASK_COLUMN.to_string());
        header.extend(self.variants.iter().cloned());

        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut cells = Vec::with_capacity(row.summaries.len() + 1);
                cells.push(row.task_name.clone());
                cells.extend(row.summaries.iter().map(|summary| match summary {
                    Some(summary) => format_ms(summary.get(metric)),
                    None => UNAVAILABLE_CELL.to_string(),
                }));
                cells
            })
            .collect();

        ComparisonTable { header, rows }
    }
}

/// Format a duration with exactly [`DISPLAY_PRECISION`] fixed decimals.
///
/// Uses Rust's `{:.N}` formatting, which rounds the exact binary value
/// half-to-even, so a given input always renders identically.
pub fn format_ms(ms: TimingSample) -> String {
    format!("{:.*}", DISPLAY_PRECISION, ms)
}

/// Horizontal alignment of a rendered column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Left,
    Right,
}

/// A header row plus data rows of preformatted strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ComparisonTable {
    /// Left for the task-name column, right for every numeric column.
    pub fn alignments(&self) -> Vec<Alignment> {
        (0..self.header.len())
            .map(|i| if i == 0 { Alignment::Left } else { Alignment::Right })
            .collect()
    }

    /// Header followed by data rows, as one grid.
    pub fn grid(&self) -> Vec<Vec<String>> {
        std::iter::once(self.header.clone())
            .chain(self.rows.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(first_run: f64, avg: f64) -> Option<TimingSummary> {
        Some(TimingSummary { first_run, avg })
    }

    #[test]
    fn repeat_zero_is_rejected() {
        assert!(MeasureParams::new(3, 0).is_err());
        assert!(MeasureParams::new(0, 1).is_ok());
    }

    #[test]
    fn deserialising_params_checks_repeat() {
        let params: MeasureParams = serde_json::from_str(r#"{"warmup":1,"repeat":2}"#).unwrap();
        assert_eq!((params.warmup(), params.repeat()), (1, 2));

        let err = serde_json::from_str::<MeasureParams>(r#"{"warmup":1,"repeat":0}"#).unwrap_err();
        assert!(err.to_string().contains("repeat must be at least 1"));
    }

    #[test]
    fn default_params_match_protocol_defaults() {
        let params = MeasureParams::default();
        assert_eq!(params.warmup(), 3);
        assert_eq!(params.repeat(), 5);
        assert_eq!(params.total_calls(), 9);
    }

    #[test]
    fn format_is_fixed_three_decimals() {
        assert_eq!(format_ms(1.0), "1.000");
        assert_eq!(format_ms(0.12345), "0.123");
        assert_eq!(format_ms(0.12345), format_ms(0.12345));
        assert_eq!(format_ms(1234.5678), "1234.568");
        assert_eq!(format_ms(1e-7), "0.000");
    }

    #[test]
    fn table_preserves_row_and_column_order() {
        let mut matrix = ComparisonMatrix::new(vec!["X".into(), "Y".into()]);
        matrix.push(ResultRow {
            task_name: "B".into(),
            summaries: vec![summary(1.0, 2.0), summary(3.0, 4.0)],
        });
        matrix.push(ResultRow {
            task_name: "A".into(),
            summaries: vec![summary(5.0, 6.0), summary(7.0, 8.0)],
        });

        let first = matrix.table(Metric::FirstRun);
        assert_eq!(first.header, vec!["task", "X", "Y"]);
        assert_eq!(first.rows[0], vec!["B", "1.000", "3.000"]);
        assert_eq!(first.rows[1], vec!["A", "5.000", "7.000"]);

        let avg = matrix.table(Metric::Avg);
        assert_eq!(avg.rows[0], vec!["B", "2.000", "4.000"]);
        assert_eq!(avg.rows[1], vec!["A", "6.000", "8.000"]);
    }

    #[test]
    fn unavailable_cells_render_as_na() {
        let mut matrix = ComparisonMatrix::new(vec!["X".into(), "Y".into()]);
        matrix.push(ResultRow {
            task_name: "A".into(),
            summaries: vec![None, summary(1.5, 2.5)],
        });
        let table = matrix.table(Metric::Avg);
        assert_eq!(table.rows[0], vec!["A", "N/A", "2.500"]);
    }

    #[test]
    fn alignment_is_left_then_right() {
        let table = ComparisonMatrix::new(vec!["X".into(), "Y".into()]).table(Metric::Avg);
        assert_eq!(
            table.alignments(),
            vec![Alignment::Left, Alignment::Right, Alignment::Right]
        );
        assert_eq!(table.grid().len(), 1);
    }
}
