// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Comparison matrix assembly: every task against every variant, strictly one
// cell at a time, tasks in catalog order and variants in declaration order.

use std::future::{Future, ready};

use tracing::{error, info, instrument, warn};

use cvbench_core::config::ErrorPolicy;
use cvbench_core::error::Result;
use cvbench_core::types::{ComparisonMatrix, MeasureParams, ResultRow, TimingSummary};
use cvbench_imgproc::SourceImage;

use crate::call::timed;
use crate::protocol::measure;
use crate::provider::{Backend, Variant};
use crate::tasks::Task;

/// Fill a matrix by awaiting `cell(task_index, variant_index)` for every
/// cell, task-major.
///
/// Under [`ErrorPolicy::Abort`] the first failing cell ends the run and its
/// error is returned; no partial matrix escapes. Under [`ErrorPolicy::Na`]
/// the cell is recorded as unavailable and the run continues.
pub async fn build_matrix<F, Fut>(
    task_names: &[&str],
    variant_labels: Vec<String>,
    policy: ErrorPolicy,
    mut cell: F,
) -> Result<ComparisonMatrix>
where
    F: FnMut(usize, usize) -> Fut,
    Fut: Future<Output = Result<TimingSummary>>,
{
    let columns = variant_labels.len();
    let mut matrix = ComparisonMatrix::new(variant_labels);

    for (t, task_name) in task_names.iter().enumerate() {
        let mut summaries = Vec::with_capacity(columns);
        for v in 0..columns {
            match cell(t, v).await {
                Ok(summary) => summaries.push(Some(summary)),
                Err(err) => match policy {
                    ErrorPolicy::Abort => {
                        error!(
                            task = %task_name,
                            variant = %matrix.variants[v],
                            error = %err,
                            "cell failed, aborting run"
                        );
                        return Err(err);
                    }
                    ErrorPolicy::Na => {
                        warn!(
                            task = %task_name,
                            variant = %matrix.variants[v],
                            error = %err,
                            "cell failed, recording N/A"
                        );
                        summaries.push(None);
                    }
                },
            }
        }
        matrix.push(ResultRow {
            task_name: task_name.to_string(),
            summaries,
        });
    }

    Ok(matrix)
}

/// Measure one (task, variant) cell.
///
/// In-process cells set up their workspace first (untimed) and drop it when
/// the cell ends. Subprocess cells hand the task name and input path to the
/// executable.
#[instrument(skip_all, fields(task = %task, variant = %variant.label))]
pub async fn run_cell(
    task: Task,
    variant: &Variant,
    source: &SourceImage,
    params: MeasureParams,
) -> Result<TimingSummary> {
    let summary = match &variant.backend {
        Backend::InProcess(lib) => {
            let lib = &**lib;
            let mut workspace = task.setup(source, lib)?;
            measure(params, || ready(timed(|| workspace.run(lib)))).await?
        }
        Backend::Subprocess(spec) => {
            let input = source.path();
            measure(params, move || spec.call(task.name(), input)).await?
        }
    };
    info!(
        first_run = summary.first_run,
        avg = summary.avg,
        "Cell measured"
    );
    Ok(summary)
}

/// Run `tasks` against `variants` on `source`.
pub async fn run_benchmark(
    tasks: &[Task],
    variants: &[Variant],
    source: &SourceImage,
    params: MeasureParams,
    policy: ErrorPolicy,
) -> Result<ComparisonMatrix> {
    let names: Vec<&str> = tasks.iter().map(Task::name).collect();
    let labels = variants.iter().map(|v| v.label.clone()).collect();
    info!(
        tasks = tasks.len(),
        variants = variants.len(),
        warmup = params.warmup(),
        repeat = params.repeat(),
        calls_per_cell = params.total_calls(),
        "Starting benchmark"
    );
    build_matrix(&names, labels, policy, move |t, v| {
        run_cell(tasks[t], &variants[v], source, params)
    })
    .await
}
