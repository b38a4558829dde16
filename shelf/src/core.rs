//! The core module defines the ingestion pipeline of shelf.
//! It provides the traits and models the [app](crate::app) adapters implement.

use crate::{error::ShelfError, map_err};
use std::path::Path;

pub mod chunk;
pub mod document;
pub mod embedder;
pub mod graph;
pub mod ingest;
pub mod retriever;
pub mod vector;

/// Check whether anything exists at `path`.
/// Errors only on IO errors other than `NotFound`.
pub(crate) async fn path_exists(path: &Path) -> Result<bool, ShelfError> {
    match tokio::fs::metadata(path).await {
        Ok(_) => Ok(true),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(false),
            _ => map_err!(Err(e)),
        },
    }
}
