// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The measurement protocol: one cold call, `warmup` discarded calls, then
// `repeat` recorded calls averaged into the steady-state figure.

use std::future::Future;

use cvbench_core::error::Result;
use cvbench_core::types::{MeasureParams, TimingSample, TimingSummary};
use tracing::debug;

/// Measure `call` under `params`.
///
/// `call` is invoked exactly `1 + warmup + repeat` times, strictly in
/// sequence. Each invocation is awaited before the next one starts. The first
/// sample becomes `first_run` and is never part of the average. Any error
/// stops the measurement immediately and is returned unchanged.
pub async fn measure<F, Fut>(params: MeasureParams, mut call: F) -> Result<TimingSummary>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<TimingSample>>,
{
    let first_run = call().await?;
    debug!(first_run, "cold call done");

    for _ in 0..params.warmup() {
        call().await?;
    }

    let mut total = 0.0;
    for _ in 0..params.repeat() {
        total += call().await?;
    }
    let avg = total / f64::from(params.repeat());

    Ok(TimingSummary { first_run, avg })
}
