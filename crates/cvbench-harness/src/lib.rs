// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// cvbench-harness — Measurement protocol, invocation styles, the task
// catalog, variant initialisation, matrix assembly and Markdown rendering.
//
// In-process calls are timed around the library operation. Subprocess calls
// run an external executable that reports its own duration on stdout. Both
// flow through the same async `measure` protocol.

pub mod call;
pub mod matrix;
pub mod presenter;
pub mod protocol;
pub mod provider;
pub mod tasks;

#[cfg(test)]
mod testing;

pub use call::{SubprocessSpec, parse_sample, timed};
pub use matrix::{build_matrix, run_benchmark};
pub use presenter::{render_markdown, render_report};
pub use protocol::measure;
pub use provider::{Variant, initialize_variants};
pub use tasks::{Task, Workspace};
