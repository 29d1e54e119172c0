// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Variant initialisation.
//
// All variants are brought up in one explicit phase before any measurement,
// so a broken variant fails the run before the first cell is timed.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use tracing::{info, instrument};

use cvbench_core::config::{HarnessConfig, VariantConfig, VariantKind};
use cvbench_core::error::{BenchError, Result};
use cvbench_imgproc::{ImageLibrary, ImageprocLibrary};

use crate::call::SubprocessSpec;

/// How a variant's calls are carried out.
pub enum Backend {
    /// Library loaded into this process; calls are timed by the harness.
    InProcess(Box<dyn ImageLibrary>),
    /// External executable that times itself.
    Subprocess(SubprocessSpec),
}

/// One initialised column of the matrix.
pub struct Variant {
    pub label: String,
    pub backend: Backend,
}

impl Variant {
    pub fn in_process(label: impl Into<String>, library: Box<dyn ImageLibrary>) -> Self {
        Self {
            label: label.into(),
            backend: Backend::InProcess(library),
        }
    }

    pub fn subprocess(label: impl Into<String>, spec: SubprocessSpec) -> Self {
        Self {
            label: label.into(),
            backend: Backend::Subprocess(spec),
        }
    }
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let backend = match &self.backend {
            Backend::InProcess(lib) => format!("in-process({})", lib.build()),
            Backend::Subprocess(spec) => format!("subprocess({})", spec.executable.display()),
        };
        f.debug_struct("Variant")
            .field("label", &self.label)
            .field("backend", &backend)
            .finish()
    }
}

/// Bring up one variant.
///
/// In-process builds are constructed directly. Subprocess variants only have
/// their executable checked; nothing is spawned until the first cell.
#[instrument(skip_all, fields(label = %config.label))]
pub async fn initialize(config: &VariantConfig, timeout: Duration) -> Result<Variant> {
    let variant = match config.kind {
        VariantKind::Scalar => {
            Variant::in_process(&config.label, Box::new(ImageprocLibrary::scalar()))
        }
        VariantKind::Threaded => {
            Variant::in_process(&config.label, Box::new(ImageprocLibrary::threaded()))
        }
        VariantKind::Subprocess => {
            let exe = config.executable.as_deref().ok_or_else(|| {
                BenchError::Config(format!(
                    "subprocess variant '{}' has no executable",
                    config.label
                ))
            })?;
            check_executable(exe).await?;
            Variant::subprocess(&config.label, SubprocessSpec::new(exe, timeout))
        }
    };
    if let Backend::InProcess(lib) = &variant.backend {
        let unthreaded = lib.unthreaded_ops();
        if !unthreaded.is_empty() {
            info!(build = lib.build(), ops = ?unthreaded, "Operations without a parallel path");
        }
    }
    info!(variant = ?variant, "Variant ready");
    Ok(variant)
}

/// Initialise every configured variant, in declaration order.
pub async fn initialize_variants(config: &HarnessConfig) -> Result<Vec<Variant>> {
    let mut variants = Vec::with_capacity(config.variants.len());
    for variant in &config.variants {
        variants.push(initialize(variant, config.subprocess_timeout()).await?);
    }
    Ok(variants)
}

async fn check_executable(path: &Path) -> Result<()> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| BenchError::SubprocessSpawn {
            executable: path.display().to_string(),
            reason: e.to_string(),
        })?;
    if !meta.is_file() {
        return Err(BenchError::SubprocessSpawn {
            executable: path.display().to_string(),
            reason: "not a regular file".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_config_brings_up_in_process_builds() {
        let variants = initialize_variants(&HarnessConfig::default()).await.unwrap();
        let labels: Vec<&str> = variants.iter().map(|v| v.label.as_str()).collect();
        assert_eq!(labels, vec!["scalar", "threaded"]);
        match &variants[1].backend {
            Backend::InProcess(lib) => assert_eq!(lib.build(), "threaded"),
            Backend::Subprocess(_) => panic!("expected an in-process build"),
        }
    }

    #[tokio::test]
    async fn threaded_build_logs_its_sequential_ops() {
        let (logs, _guard) = crate::testing::capture_logs();
        let config = VariantConfig::in_process("mt", VariantKind::Threaded);
        initialize(&config, Duration::from_secs(1)).await.unwrap();
        let text = logs.contents();
        assert!(text.contains("Operations without a parallel path"));
        assert!(text.contains("findContours"));
    }

    #[tokio::test]
    async fn missing_executable_fails_initialisation() {
        let config = VariantConfig::subprocess("opt3", "/no/such/cvbench-native");
        let err = initialize(&config, Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, BenchError::SubprocessSpawn { .. }));
    }

    #[tokio::test]
    async fn subprocess_variant_keeps_timeout() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = VariantConfig::subprocess("opt1", file.path());
        let variant = initialize(&config, Duration::from_secs(7)).await.unwrap();
        match variant.backend {
            Backend::Subprocess(spec) => {
                assert_eq!(spec.executable, file.path());
                assert_eq!(spec.timeout, Duration::from_secs(7));
            }
            Backend::InProcess(_) => panic!("expected a subprocess variant"),
        }
    }
}
