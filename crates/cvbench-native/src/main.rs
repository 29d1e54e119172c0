// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// cvbench-native — runs one task once and prints its own duration.
//
//   cvbench-native <task> <file>
//
// On success stdout holds the elapsed milliseconds with three decimals and a
// newline, nothing else. Failures go to stderr with exit status 1. Build it
// under the `opt1`..`optz` profiles to get one subprocess variant per
// optimisation level.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use cvbench_core::error::Result;
use cvbench_core::types::{TimingSample, format_ms};
use cvbench_harness::{Task, timed};
use cvbench_imgproc::{Execution, ImageLibrary, ImageprocLibrary, SourceImage};

/// Time one image-processing task on one image.
#[derive(Parser, Debug)]
#[command(name = "cvbench-native", version, about, long_about = None)]
struct Cli {
    /// Task name, e.g. `blur` or `GaussianBlur`.
    task: String,

    /// Input image.
    file: PathBuf,

    /// Fan per-channel and per-row work out over the thread pool.
    #[arg(long)]
    threaded: bool,
}

impl Cli {
    fn library(&self) -> ImageprocLibrary {
        if self.threaded {
            ImageprocLibrary::new(Execution::Threaded)
        } else {
            ImageprocLibrary::new(Execution::Scalar)
        }
    }
}

/// Load, set up, then time exactly the task's library call.
fn run(cli: &Cli) -> Result<TimingSample> {
    let task = Task::from_name(&cli.task)?;
    let source = SourceImage::open(&cli.file)?;
    let lib = cli.library();
    let mut workspace = task.setup(&source, &lib)?;
    let elapsed = timed(|| workspace.run(&lib))?;
    debug!(task = %task, build = lib.build(), elapsed, "task timed");
    Ok(elapsed)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help / --version
        Err(err) if !err.use_stderr() => {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            let _ = err.print();
            return ExitCode::FAILURE;
        }
    };

    match run(&cli) {
        Ok(elapsed) => {
            println!("{}", format_ms(elapsed));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvbench_core::error::BenchError;
    use image::{Rgba, RgbaImage};

    fn cli(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("cvbench-native").chain(args.iter().copied()))
    }

    #[test]
    fn requires_task_and_file() {
        assert!(cli(&[]).is_err());
        assert!(cli(&["blur"]).is_err());
        let parsed = cli(&["blur", "flower.jpg"]).unwrap();
        assert_eq!(parsed.task, "blur");
        assert_eq!(parsed.file, PathBuf::from("flower.jpg"));
        assert!(!parsed.threaded);
    }

    #[test]
    fn version_is_not_an_error_exit() {
        let err = cli(&["--version"]).unwrap_err();
        assert!(!err.use_stderr());
    }

    #[test]
    fn unknown_task_fails_before_loading() {
        let parsed = cli(&["sharpen", "/no/such/file.png"]).unwrap();
        assert!(matches!(run(&parsed), Err(BenchError::UnknownTask(_))));
    }

    #[test]
    fn unreadable_image_fails() {
        let parsed = cli(&["blur", "/no/such/file.png"]).unwrap();
        assert!(matches!(run(&parsed), Err(BenchError::ImageLoad(_))));
    }

    #[test]
    fn times_a_task_on_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.png");
        RgbaImage::from_fn(32, 24, |x, y| Rgba([(x * 7) as u8, (y * 9) as u8, 100, 255]))
            .save(&path)
            .unwrap();
        let path = path.to_string_lossy().to_string();

        for args in [vec!["stackBlur", path.as_str()], vec!["--threaded", "LUT", path.as_str()]] {
            let parsed = cli(&args).unwrap();
            let elapsed = run(&parsed).unwrap();
            assert!(elapsed >= 0.0);
            assert_eq!(format_ms(elapsed).split('.').nth(1).map(str::len), Some(3));
        }
    }
}
