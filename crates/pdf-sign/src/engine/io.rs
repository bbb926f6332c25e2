//! File helpers for the async entry points

use crate::types::*;
use std::path::Path;

/// Read a whole file (PDF, key store, stamp image)
pub async fn load_file(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let bytes = tokio::fs::read(path.as_ref()).await?;
    log::debug!("Read {} bytes from {}", bytes.len(), path.as_ref().display());
    Ok(bytes)
}

/// Write a signed or prepared document
pub async fn save_file(bytes: &[u8], path: impl AsRef<Path>) -> Result<()> {
    tokio::fs::write(path.as_ref(), bytes).await?;
    log::debug!("Wrote {} bytes to {}", bytes.len(), path.as_ref().display());
    Ok(())
}
