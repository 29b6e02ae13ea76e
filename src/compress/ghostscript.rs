//! External tool strategy: Ghostscript `pdfwrite`
//!
//! The tool is spawned directly with an argv vector (no shell) and given a
//! bounded amount of time. On timeout the child is killed.

use crate::compress::level::LevelProfile;
use crate::error::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Longest stderr excerpt carried into a failure reason
const MAX_STDERR_CHARS: usize = 512;

/// Ghostscript invocation settings
#[derive(Debug, Clone)]
pub struct Ghostscript {
    binary: PathBuf,
    timeout: Duration,
}

impl Ghostscript {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    /// Build the argument list for one run
    pub fn args(profile: &LevelProfile, input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-sDEVICE=pdfwrite".into(),
            format!("-dPDFSETTINGS={}", profile.pdf_settings).into(),
            "-dCompatibilityLevel=1.4".into(),
            "-dNOPAUSE".into(),
            "-dQUIET".into(),
            "-dBATCH".into(),
        ];

        if let Some(downsample) = &profile.downsample {
            args.push(format!("-dColorImageDownsampleType={}", downsample.color).into());
            args.push(format!("-dGrayImageDownsampleType={}", downsample.gray).into());
            args.push(format!("-dMonoImageDownsampleType={}", downsample.mono).into());
        }

        if let Some(dpi) = profile.image_resolution {
            args.push(format!("-dColorImageResolution={}", dpi).into());
            args.push(format!("-dGrayImageResolution={}", dpi).into());
            args.push(format!("-dMonoImageResolution={}", dpi).into());
        }

        let mut output_arg = OsString::from("-sOutputFile=");
        output_arg.push(output.as_os_str());
        args.push(output_arg);
        args.push(input.as_os_str().to_owned());

        args
    }

    /// Run the tool and wait for it to exit.
    ///
    /// Succeeds only on a zero exit status. The output file is not inspected
    /// here.
    pub async fn run(&self, profile: &LevelProfile, input: &Path, output: &Path) -> Result<()> {
        let child = Command::new(&self.binary)
            .args(Self::args(profile, input, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::ExternalTool {
                reason: format!("failed to spawn {}: {}", self.binary.display(), e),
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| Error::ExternalTool {
                reason: format!("timed out after {}s", self.timeout.as_secs()),
            })?
            .map_err(|e| Error::ExternalTool {
                reason: format!("failed to wait for process: {}", e),
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr: String = stderr.trim().chars().take(MAX_STDERR_CHARS).collect();
        let status = match output.status.code() {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        };

        Err(Error::ExternalTool {
            reason: if stderr.is_empty() {
                status
            } else {
                format!("{}: {}", status, stderr)
            },
        })
    }
}
