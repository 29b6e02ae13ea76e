//! Artifact checks using qpdf (vendored FFI)
//!
//! Each strategy's output is opened before it is accepted, so a truncated
//! or mangled file never reaches a download link.

use crate::error::{Error, Result};
use qpdf::QPdf;

/// Map qpdf crate errors to our error types
fn map_qpdf_error(e: qpdf::QPdfError) -> Error {
    Error::InvalidArtifact {
        reason: e.to_string(),
    }
}

/// Get the page count of a PDF held in memory
pub fn page_count(data: &[u8]) -> Result<u32> {
    let qpdf = QPdf::read_from_memory(data).map_err(map_qpdf_error)?;
    qpdf.get_num_pages().map_err(map_qpdf_error)
}

/// Check that `artifact` opens as a PDF and, when the source page count is
/// known, that no pages were lost or gained.
pub fn verify_artifact(artifact: &[u8], expected_pages: Option<u32>) -> Result<u32> {
    if artifact.len() < 4 || &artifact[0..4] != b"%PDF" {
        return Err(Error::InvalidArtifact {
            reason: "missing PDF header".to_string(),
        });
    }

    let pages = page_count(artifact)?;

    if let Some(expected) = expected_pages {
        if pages != expected {
            return Err(Error::InvalidArtifact {
                reason: format!("page count changed from {} to {}", expected, pages),
            });
        }
    }

    Ok(pages)
}
