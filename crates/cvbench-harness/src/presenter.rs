// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Markdown rendering of comparison tables.

use std::fmt::Write;

use cvbench_core::types::{Alignment, ComparisonMatrix, ComparisonTable, Metric};

/// Narrowest column that still fits an alignment marker.
const MIN_WIDTH: usize = 3;

/// Render one table as GitHub-flavoured Markdown.
///
/// Columns are padded to a common width. The delimiter row carries the
/// alignment markers: `:---` for left, `---:` for right.
pub fn render_markdown(table: &ComparisonTable) -> String {
    let grid = table.grid();
    let alignments = table.alignments();
    let widths: Vec<usize> = (0..table.header.len())
        .map(|col| {
            grid.iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
                .max(MIN_WIDTH)
        })
        .collect();

    let mut out = String::new();
    push_row(&mut out, &table.header, &widths, &alignments);

    out.push('|');
    for (width, align) in widths.iter().zip(&alignments) {
        let dashes = "-".repeat(width - 1);
        match align {
            Alignment::Left => {
                let _ = write!(out, " :{dashes} |");
            }
            Alignment::Right => {
                let _ = write!(out, " {dashes}: |");
            }
        }
    }
    out.push('\n');

    for row in &table.rows {
        push_row(&mut out, row, &widths, &alignments);
    }
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize], alignments: &[Alignment]) {
    out.push('|');
    for (col, width) in widths.iter().enumerate() {
        let cell = cells.get(col).map(String::as_str).unwrap_or("");
        let _ = match alignments[col] {
            Alignment::Left => write!(out, " {cell:<width$} |"),
            Alignment::Right => write!(out, " {cell:>width$} |"),
        };
    }
    out.push('\n');
}

/// Both tables of a run, each under its heading.
pub fn render_report(matrix: &ComparisonMatrix) -> String {
    let mut out = String::new();
    for metric in [Metric::FirstRun, Metric::Avg] {
        out.push_str(metric.heading());
        out.push('\n');
        out.push_str(&render_markdown(&matrix.table(metric)));
    }
    out
}
