//! PDF Compression Server Library
//!
//! An HTTP service that shrinks uploaded PDFs:
//! - `POST /compress`: run Ghostscript, fall back to an in-process rewrite,
//!   and never return anything larger than the upload
//! - `GET /download/:filename`: fetch the result
//! - `GET /api/status`: liveness probe

pub mod cli;
pub mod compress;
pub mod error;
pub mod pdf;
pub mod server;
pub mod storage;

pub use compress::{
    CompressionLevel, CompressionOutcome, CompressionRequest, Ghostscript, Orchestrator, Strategy,
};
pub use error::{Error, Result};
pub use server::{router, run_server_with_config, AppState, ServerConfig};
pub use storage::WorkingStorage;
