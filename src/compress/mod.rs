//! Compression strategies and the orchestrator that chooses between them

mod ghostscript;
mod level;
mod orchestrator;

pub use ghostscript::Ghostscript;
pub use level::{CompressionLevel, DownsampleTypes, LevelProfile};
pub use orchestrator::{
    savings_ratio, CompressionOutcome, CompressionRequest, Orchestrator, Strategy,
};
