//! Error types for the PDF compression server

use thiserror::Error;

/// Result type alias for the PDF compression server
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the PDF compression server
#[derive(Error, Debug)]
pub enum Error {
    /// Upload carried no `pdf` field
    #[error("no file provided")]
    NoFile,

    /// Uploaded file was not declared as `application/pdf`
    #[error("unsupported file type: {content_type}")]
    UnsupportedFileType { content_type: String },

    /// Upload exceeded the configured ceiling
    #[error("upload too large (max: {max_bytes} bytes)")]
    UploadTooLarge { max_bytes: u64 },

    /// Multipart body could not be read
    #[error("malformed upload: {reason}")]
    MalformedUpload { reason: String },

    /// External tool failed (spawn error, non-zero exit, timeout, empty output)
    #[error("external tool failed: {reason}")]
    ExternalTool { reason: String },

    /// In-process re-serialization failed
    #[error("fallback re-serialization failed: {reason}")]
    Fallback { reason: String },

    /// A strategy produced a file that does not open as a PDF
    #[error("invalid artifact: {reason}")]
    InvalidArtifact { reason: String },

    /// Both strategies failed or storage could not be written
    #[error("compression failed: {reason}")]
    CompressionFailed { reason: String },

    /// Requested download does not exist
    #[error("file not found: {filename}")]
    FileNotFound { filename: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Return a sanitized error message safe to send to clients.
    /// Filesystem paths never appear in these messages.
    pub fn client_message(&self) -> String {
        match self {
            Error::NoFile => "no file provided".to_string(),
            Error::UnsupportedFileType { .. } => "unsupported file type".to_string(),
            Error::UploadTooLarge { max_bytes } => {
                format!("file exceeds maximum size of {} bytes", max_bytes)
            }
            Error::MalformedUpload { reason } => format!("malformed upload: {}", reason),
            Error::ExternalTool { .. } | Error::InvalidArtifact { .. } => {
                "compression failed".to_string()
            }
            Error::Fallback { reason } | Error::CompressionFailed { reason } => {
                format!("compression failed: {}", reason)
            }
            Error::FileNotFound { .. } => "file not found".to_string(),
            Error::Io(_) => "compression failed: I/O error".to_string(),
        }
    }

    /// HTTP status code this error maps to
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;

        match self {
            Error::NoFile | Error::UnsupportedFileType { .. } | Error::MalformedUpload { .. } => {
                StatusCode::BAD_REQUEST
            }
            Error::UploadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::FileNotFound { .. } => StatusCode::NOT_FOUND,
            Error::ExternalTool { .. }
            | Error::Fallback { .. }
            | Error::InvalidArtifact { .. }
            | Error::CompressionFailed { .. }
            | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this error is the caller's fault rather than the server's
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}
