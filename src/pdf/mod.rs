//! PDF processing layer
//!
//! This module provides the in-process fallback (lopdf) and artifact checks
//! (qpdf). Neither inspects document content beyond what they need.

mod inspect;
mod rewrite;

pub use inspect::{page_count, verify_artifact};
pub use rewrite::{rewrite, RewriteOptions};
