//! Command-line and environment configuration

use crate::server::ServerConfig;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "pdf-compress-server")]
#[command(
    author,
    version,
    about = "HTTP service that shrinks uploaded PDFs with Ghostscript and an in-process fallback"
)]
pub struct Args {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Directory holding uploads/ and compressed/
    #[arg(short = 'd', long, env = "PDF_WORK_DIR", default_value = ".")]
    pub work_dir: PathBuf,

    /// Ghostscript executable
    #[arg(long, env = "GS_BINARY", default_value = "gs")]
    pub gs_binary: PathBuf,

    /// Seconds to wait for Ghostscript before killing it
    #[arg(long, env = "GS_TIMEOUT_SECS", default_value_t = 120, value_parser = clap::value_parser!(u64).range(1..))]
    pub gs_timeout_secs: u64,

    /// Skip Ghostscript and always use the in-process rewrite
    #[arg(long, env = "NO_EXTERNAL_TOOL")]
    pub no_external_tool: bool,

    /// Largest accepted upload in megabytes
    #[arg(long, env = "MAX_UPLOAD_MB", default_value_t = 50, value_parser = clap::value_parser!(u64).range(1..=1024))]
    pub max_upload_mb: u64,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            work_dir: args.work_dir,
            gs_binary: args.gs_binary,
            external_tool_enabled: !args.no_external_tool,
            gs_timeout: Duration::from_secs(args.gs_timeout_secs),
            max_upload_bytes: args.max_upload_mb * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_server_config() {
        let config = ServerConfig::from(Args::parse_from(["pdf-compress-server"]));
        let defaults = ServerConfig::default();
        assert_eq!(config.gs_timeout, defaults.gs_timeout);
        assert_eq!(config.max_upload_bytes, defaults.max_upload_bytes);
        assert!(config.external_tool_enabled);
    }

    #[test]
    fn test_flags() {
        let config = ServerConfig::from(Args::parse_from([
            "pdf-compress-server",
            "--port",
            "8080",
            "--no-external-tool",
            "--max-upload-mb",
            "25",
            "--work-dir",
            "/tmp/pdf",
        ]));
        assert_eq!(config.port, 8080);
        assert!(!config.external_tool_enabled);
        assert_eq!(config.max_upload_bytes, 25 * 1024 * 1024);
        assert_eq!(config.work_dir, PathBuf::from("/tmp/pdf"));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        assert!(Args::try_parse_from(["pdf-compress-server", "--gs-timeout-secs", "0"]).is_err());
    }
}
