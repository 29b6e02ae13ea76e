//! Shared helpers for integration tests

#![allow(dead_code)]

use lopdf::{dictionary, Document, Object, Stream};
use std::path::{Path, PathBuf};

pub const BOUNDARY: &str = "----pdfcompressboundary7MA4YWxkTrZu0gW";

/// One-page PDF whose content stream is stored uncompressed, so it shrinks
/// well. `repeat` scales the content size.
pub fn sample_pdf(repeat: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let content = "BT /F1 12 Tf 72 712 Td (The quick brown fox jumps over the lazy dog) Tj ET\n"
        .repeat(repeat);
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
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .expect("Failed to build sample PDF");
    buffer
}

/// Write `data` into `dir/name` and return the path
pub fn write_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).expect("Failed to write test file");
    path
}

/// A stand-in for Ghostscript that copies `artifact` to whatever
/// `-sOutputFile=` names and exits 0.
#[cfg(unix)]
pub fn fake_gs(dir: &Path, artifact: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = format!(
        "#!/bin/sh\n\
         out=\"\"\n\
         for arg in \"$@\"; do\n\
           case \"$arg\" in\n\
             -sOutputFile=*) out=\"${{arg#-sOutputFile=}}\" ;;\n\
           esac\n\
         done\n\
         cp \"{}\" \"$out\"\n",
        artifact.display()
    );

    let path = dir.join("fake-gs");
    std::fs::write(&path, script).expect("Failed to write fake gs");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to mark fake gs executable");
    path
}

/// Multipart body with an optional `pdf` file part and an optional
/// `compressionLevel` part.
pub fn multipart_body(file: Option<(&str, &[u8])>, level: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();

    if let Some(level) = level {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            b"Content-Disposition: form-data; name=\"compressionLevel\"\r\n\r\n",
        );
        body.extend_from_slice(level.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    if let Some((content_type, data)) = file {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            b"Content-Disposition: form-data; name=\"pdf\"; filename=\"upload.pdf\"\r\n",
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

/// Number of regular files in a directory
pub fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file())
                .count()
        })
        .unwrap_or(0)
}
