//! Incremental signing: fill the reserved signature value
//!
//! The revision written by the document model contains a fixed-width
//! /ByteRange array and a /Contents hex string of zeros. Signing covers every byte
//! of the file except the /Contents string itself:
//!
//! ```text
//! [0 ........ a)<hex placeholder>[b ........ len)
//! /ByteRange [0 a b len-b]
//! ```

use crate::crypto::{DetachedSigner, DigestAlgorithm};
use crate::pdf::{IncrementalUpdate, SignaturePlaceholder, writer::hex_encode};
use crate::types::{EngineError, Result};

/// Patch /ByteRange, sign the covered bytes and embed the CMS blob.
///
/// Returns the final file. Nothing is returned on failure.
pub fn finish_signature(update: IncrementalUpdate, signer: &dyn DetachedSigner) -> Result<Vec<u8>> {
    let IncrementalUpdate { mut bytes, placeholder } = update;
    let placeholder = placeholder.ok_or_else(|| {
        EngineError::SigningFailure("revision carries no signature placeholder".to_string())
    })?;
    check_placeholder(&bytes, &placeholder)?;

    let a = placeholder.contents_offset;
    let b = placeholder.contents_offset + placeholder.contents_len;
    let range = [0, a, b, bytes.len() - b];

    let byte_range = format!("{} {} {} {}", range[0], range[1], range[2], range[3]);
    if byte_range.len() > placeholder.byte_range_width {
        return Err(EngineError::SigningFailure(format!(
            "byte range '{}' does not fit the reserved {} bytes",
            byte_range, placeholder.byte_range_width
        )));
    }
    let padded = format!("{:<width$}", byte_range, width = placeholder.byte_range_width);
    let start = placeholder.byte_range_offset + 1;
    bytes[start..start + placeholder.byte_range_width].copy_from_slice(padded.as_bytes());

    let mut covered = Vec::with_capacity(a + range[3]);
    covered.extend_from_slice(&bytes[..a]);
    covered.extend_from_slice(&bytes[b..]);

    let cms = signer.sign_detached(DigestAlgorithm::Sha256, &covered).inspect_err(|e| {
        log::error!(
            "Detached signing failed over {} bytes (byte range {:?}): {}",
            covered.len(),
            range,
            e
        );
    })?;

    let capacity = (placeholder.contents_len - 2) / 2;
    if cms.len() > capacity {
        log::error!(
            "Signature of {} bytes exceeds the reserved {} bytes",
            cms.len(),
            capacity
        );
        return Err(EngineError::SigningFailure(format!(
            "signature needs {} bytes but only {} were reserved",
            cms.len(),
            capacity
        )));
    }

    let hex = hex_encode(&cms);
    bytes[a + 1..a + 1 + hex.len()].copy_from_slice(hex.as_bytes());

    log::debug!(
        "Embedded {} byte signature, byte range {:?}",
        cms.len(),
        range
    );
    Ok(bytes)
}

fn check_placeholder(bytes: &[u8], placeholder: &SignaturePlaceholder) -> Result<()> {
    let contents_end = placeholder.contents_offset + placeholder.contents_len;
    let range_end = placeholder.byte_range_offset + placeholder.byte_range_width + 2;

    let valid = contents_end <= bytes.len()
        && range_end <= bytes.len()
        && placeholder.contents_len >= 2
        && bytes[placeholder.contents_offset] == b'<'
        && bytes[contents_end - 1] == b'>'
        && bytes[placeholder.byte_range_offset] == b'['
        && bytes[range_end - 1] == b']';

    if valid {
        Ok(())
    } else {
        Err(EngineError::SigningFailure(
            "signature placeholder offsets do not match the written revision".to_string(),
        ))
    }
}
