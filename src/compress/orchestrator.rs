//! Strategy selection and the no-worse-than-original rule
//!
//! External tool first, in-process rewrite second, original file last.

use crate::compress::ghostscript::Ghostscript;
use crate::compress::level::{CompressionLevel, LevelProfile};
use crate::error::{Error, Result};
use crate::pdf::{page_count, rewrite, verify_artifact, RewriteOptions};
use bytes::Bytes;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One upload to compress
#[derive(Debug, Clone)]
pub struct CompressionRequest {
    pub source_bytes: Bytes,
    pub level: CompressionLevel,
    pub source_path: PathBuf,
}

/// Which strategy produced the effective result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    ExternalTool,
    FallbackLibrary,
    /// The original file is the result
    None,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::ExternalTool => "external-tool",
            Strategy::FallbackLibrary => "fallback-library",
            Strategy::None => "none",
        }
    }
}

/// Result of one compression
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionOutcome {
    pub strategy_used: Strategy,
    pub original_size: u64,
    pub final_size: u64,
    /// Percentage saved, in `[0, 100]`, two decimals
    pub savings_ratio: f64,
    pub final_path: PathBuf,
    pub was_compressed: bool,
    /// Why the external tool was skipped, if it was
    pub primary_error: Option<String>,
}

impl CompressionOutcome {
    /// Apply the no-worse-than-original rule to a finished attempt.
    ///
    /// An empty artifact, or one not strictly smaller than the source, is
    /// discarded in favor of the source itself.
    pub fn resolve(
        produced_by: Strategy,
        source_path: &Path,
        original_size: u64,
        artifact_path: &Path,
        artifact_size: u64,
        primary_error: Option<String>,
    ) -> Self {
        if artifact_size == 0 || artifact_size >= original_size {
            return Self {
                strategy_used: Strategy::None,
                original_size,
                final_size: original_size,
                savings_ratio: 0.0,
                final_path: source_path.to_path_buf(),
                was_compressed: false,
                primary_error,
            };
        }

        Self {
            strategy_used: produced_by,
            original_size,
            final_size: artifact_size,
            savings_ratio: savings_ratio(original_size, artifact_size),
            final_path: artifact_path.to_path_buf(),
            was_compressed: true,
            primary_error,
        }
    }

    /// File name of the effective result, without its directory
    pub fn final_filename(&self) -> String {
        self.final_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn bytes_saved(&self) -> u64 {
        self.original_size.saturating_sub(self.final_size)
    }
}

/// Percentage reduction rounded to two decimals, clamped to `[0, 100]`
pub fn savings_ratio(original_size: u64, final_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    let saved = original_size.saturating_sub(final_size) as f64;
    let ratio = (saved / original_size as f64 * 100.0).clamp(0.0, 100.0);
    (ratio * 100.0).round() / 100.0
}

/// Runs the strategy chain for each request
#[derive(Debug, Clone)]
pub struct Orchestrator {
    external_tool: Option<Ghostscript>,
}

impl Orchestrator {
    /// `None` disables the external tool; every request goes to the fallback.
    pub fn new(external_tool: Option<Ghostscript>) -> Self {
        Self { external_tool }
    }

    pub fn has_external_tool(&self) -> bool {
        self.external_tool.is_some()
    }

    /// Compress `request` into `destination`.
    ///
    /// Fails only when the external tool and the fallback both fail, or the
    /// source cannot be measured.
    pub async fn compress(
        &self,
        request: &CompressionRequest,
        destination: &Path,
    ) -> Result<CompressionOutcome> {
        let profile = request.level.profile();
        let original_size = tokio::fs::metadata(&request.source_path).await?.len();

        let source_pages = source_page_count(request.source_bytes.clone()).await;

        let (produced_by, primary_error) = match self
            .run_external(request, profile, destination, source_pages)
            .await
        {
            Ok(()) => (Strategy::ExternalTool, None),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    level = %request.level,
                    "external tool failed, using fallback"
                );
                self.run_fallback(request, profile, destination, source_pages)
                    .await
                    .map_err(|fallback_err| Error::CompressionFailed {
                        reason: match fallback_err {
                            Error::Fallback { reason } | Error::InvalidArtifact { reason } => {
                                reason
                            }
                            other => other.to_string(),
                        },
                    })?;
                (Strategy::FallbackLibrary, Some(e.to_string()))
            }
        };

        let artifact_size = file_len(destination).await;
        let outcome = CompressionOutcome::resolve(
            produced_by,
            &request.source_path,
            original_size,
            destination,
            artifact_size,
            primary_error,
        );

        tracing::info!(
            level = %request.level,
            produced_by = produced_by.as_str(),
            strategy = outcome.strategy_used.as_str(),
            original_size = outcome.original_size,
            final_size = outcome.final_size,
            savings_ratio = outcome.savings_ratio,
            "compression finished"
        );

        Ok(outcome)
    }

    async fn run_external(
        &self,
        request: &CompressionRequest,
        profile: &LevelProfile,
        destination: &Path,
        source_pages: Option<u32>,
    ) -> Result<()> {
        let tool = self
            .external_tool
            .as_ref()
            .ok_or_else(|| Error::ExternalTool {
                reason: "external tool disabled".to_string(),
            })?;

        tool.run(profile, &request.source_path, destination).await?;

        let artifact = match tokio::fs::read(destination).await {
            Ok(data) if !data.is_empty() => data,
            Ok(_) => {
                return Err(Error::ExternalTool {
                    reason: "tool produced an empty file".to_string(),
                })
            }
            Err(e) => {
                return Err(Error::ExternalTool {
                    reason: format!("tool produced no output: {}", e),
                })
            }
        };

        check_artifact(artifact, source_pages)
            .await
            .map_err(|e| Error::ExternalTool {
                reason: e.to_string(),
            })
    }

    async fn run_fallback(
        &self,
        request: &CompressionRequest,
        profile: &LevelProfile,
        destination: &Path,
        source_pages: Option<u32>,
    ) -> Result<()> {
        let data = request.source_bytes.clone();
        let options = RewriteOptions::from_granularity(profile.work_granularity);

        let output = tokio::task::spawn_blocking(move || rewrite(&data, &options))
            .await
            .map_err(|e| Error::Fallback {
                reason: format!("Task join error: {}", e),
            })??;

        tokio::fs::write(destination, &output).await?;

        if file_len(destination).await == 0 {
            return Err(Error::Fallback {
                reason: "nothing was written".to_string(),
            });
        }

        check_artifact(output, source_pages).await
    }
}

/// Page count of the upload, `None` when qpdf cannot tell
async fn source_page_count(data: Bytes) -> Option<u32> {
    match tokio::task::spawn_blocking(move || page_count(&data)).await {
        Ok(Ok(pages)) => Some(pages),
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "source page count unavailable");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "page count task failed, skipping page check");
            None
        }
    }
}

async fn check_artifact(artifact: Vec<u8>, source_pages: Option<u32>) -> Result<()> {
    tokio::task::spawn_blocking(move || verify_artifact(&artifact, source_pages))
        .await
        .map_err(|e| Error::InvalidArtifact {
            reason: format!("Task join error: {}", e),
        })??;
    Ok(())
}

/// Size of a file, zero when missing
async fn file_len(path: &Path) -> u64 {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.len())
        .unwrap_or(0)
}
