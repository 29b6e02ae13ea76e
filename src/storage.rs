//! Working storage for uploads and compressed outputs
//!
//! Created once at startup and shared by handle. Compression code only sees
//! the paths it hands out, never where they live.

use crate::error::Result;
use std::path::{Path, PathBuf};

const UPLOADS_DIR: &str = "uploads";
const OUTPUTS_DIR: &str = "compressed";
const OUTPUT_PREFIX: &str = "compressed-";

/// Upload and output directories under a common root
#[derive(Debug, Clone)]
pub struct WorkingStorage {
    uploads: PathBuf,
    outputs: PathBuf,
}

impl WorkingStorage {
    /// Create the directory layout under `root` if missing
    pub fn init<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        let uploads = root.join(UPLOADS_DIR);
        let outputs = root.join(OUTPUTS_DIR);

        std::fs::create_dir_all(&uploads)?;
        std::fs::create_dir_all(&outputs)?;

        tracing::info!(
            uploads = %uploads.display(),
            outputs = %outputs.display(),
            "working storage ready"
        );

        Ok(Self { uploads, outputs })
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads
    }

    pub fn outputs_dir(&self) -> &Path {
        &self.outputs
    }

    /// Generate a collision-free upload name: `pdf-<unix-millis>-<random>.pdf`
    pub fn unique_upload_name() -> String {
        let millis = chrono::Utc::now().timestamp_millis();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("pdf-{}-{}.pdf", millis, &suffix[..12])
    }

    pub fn upload_path(&self, name: &str) -> PathBuf {
        self.uploads.join(name)
    }

    /// Output location paired with an upload name
    pub fn output_path_for(&self, upload_name: &str) -> PathBuf {
        self.outputs
            .join(format!("{}{}", OUTPUT_PREFIX, upload_name))
    }

    /// Resolve a download name to an existing file.
    ///
    /// Outputs are searched first, then uploads (an unchanged original is
    /// served from there). Names carrying any path component are refused.
    pub fn locate(&self, filename: &str) -> Option<PathBuf> {
        if !is_plain_filename(filename) {
            return None;
        }

        [&self.outputs, &self.uploads]
            .into_iter()
            .map(|dir| dir.join(filename))
            .find(|path| path.is_file())
    }
}

/// A bare file name with no directory parts
fn is_plain_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
        && !name.contains("..")
}
