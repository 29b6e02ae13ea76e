//! In-process re-serialization with lopdf
//!
//! Used when the external tool is unavailable or fails. The document is
//! loaded, optionally pruned, its streams deflated, and written back with
//! object and cross-reference streams.

use crate::error::{Error, Result};
use lopdf::{Document, SaveOptions};

/// Re-serialization settings derived from a level's work granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Deflate level for object streams (0-9)
    pub compression_level: u8,
    /// Drop objects not reachable from the trailer
    pub prune_unreferenced: bool,
    /// Remove streams with no content
    pub drop_empty_streams: bool,
}

impl RewriteOptions {
    /// Smaller granularity buys a more thorough (and slower) pass.
    pub fn from_granularity(granularity: usize) -> Self {
        let compression_level = match granularity {
            0..=5 => 9,
            6..=10 => 8,
            11..=20 => 6,
            _ => 4,
        };

        Self {
            compression_level,
            prune_unreferenced: granularity <= 20,
            drop_empty_streams: granularity <= 10,
        }
    }
}

/// Load `input_data` and write it back in compact form
pub fn rewrite(input_data: &[u8], options: &RewriteOptions) -> Result<Vec<u8>> {
    let mut doc = Document::load_mem(input_data).map_err(|e| Error::Fallback {
        reason: format!("failed to load document: {}", e),
    })?;

    if options.prune_unreferenced {
        let pruned = doc.prune_objects();
        tracing::debug!(count = pruned.len(), "pruned unreferenced objects");
    }
    if options.drop_empty_streams {
        let dropped = doc.delete_zero_length_streams();
        tracing::debug!(count = dropped.len(), "dropped zero-length streams");
    }

    doc.compress();

    let save_options = SaveOptions::builder()
        .use_object_streams(true)
        .use_xref_streams(true)
        .compression_level(options.compression_level.into())
        .build();

    let mut output = Vec::with_capacity(input_data.len());
    doc.save_with_options(&mut output, save_options)
        .map_err(|e| Error::Fallback {
            reason: format!("failed to save document: {}", e),
        })?;

    if output.is_empty() {
        return Err(Error::Fallback {
            reason: "re-serialization produced no output".to_string(),
        });
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Object, Stream};

    /// A one-page document whose content stream is stored uncompressed
    fn bloated_pdf(repeat: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let content = "BT /F1 12 Tf 72 712 Td (Lorem ipsum dolor sit amet) Tj ET\n".repeat(repeat);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    #[test]
    fn test_options_scale_with_granularity() {
        let thorough = RewriteOptions::from_granularity(5);
        let quick = RewriteOptions::from_granularity(50);
        assert_eq!(thorough.compression_level, 9);
        assert!(thorough.prune_unreferenced && thorough.drop_empty_streams);
        assert_eq!(quick.compression_level, 4);
        assert!(!quick.prune_unreferenced && !quick.drop_empty_streams);
    }

    #[test]
    fn test_rewrite_shrinks_uncompressed_content() {
        let input = bloated_pdf(2000);
        let output = rewrite(&input, &RewriteOptions::from_granularity(20)).unwrap();
        assert!(output.starts_with(b"%PDF"));
        assert!(
            output.len() < input.len(),
            "expected {} < {}",
            output.len(),
            input.len()
        );
    }

    #[test]
    fn test_rewrite_output_reloads() {
        let input = bloated_pdf(100);
        let output = rewrite(&input, &RewriteOptions::from_granularity(5)).unwrap();
        let doc = Document::load_mem(&output).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_rewrite_rejects_garbage() {
        let err = rewrite(
            b"definitely not a pdf",
            &RewriteOptions::from_granularity(20),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Fallback { .. }));
    }
}
