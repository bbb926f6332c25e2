//! Shared constants for placement and signing
//!
//! This module centralizes magic numbers and PDF names used throughout
//! the signing process.

// =============================================================================
// Default Page Dimensions
// =============================================================================

/// Default page width in points (US Letter: 8.5" × 11")
pub const DEFAULT_PAGE_WIDTH_PT: f32 = 612.0;

/// Default page height in points (US Letter)
pub const DEFAULT_PAGE_HEIGHT_PT: f32 = 792.0;

/// Slack allowed when checking a placement against the page edges (points)
pub const GEOMETRY_TOLERANCE_PT: f32 = 0.01;

// =============================================================================
// Stamp Appearance
// =============================================================================

/// Caption font size (points)
pub const DEFAULT_CAPTION_FONT_SIZE: f32 = 8.0;

/// Line height as a multiple of the font size. Below 1.0 keeps the caption compact.
pub const DEFAULT_LEADING_FACTOR: f32 = 0.9;

/// Inner padding of each stamp half (points)
pub const DEFAULT_STAMP_PADDING: f32 = 2.0;

/// Resource name of the stamp image inside the appearance XObject
pub const STAMP_IMAGE_RESOURCE: &str = "Im0";

/// Resource name of the caption font inside the appearance XObject
pub const STAMP_FONT_RESOURCE: &str = "F1";

/// Prefix for XObject names registered in page resources
pub const STAMP_XOBJECT_PREFIX: &str = "SigStamp";

// =============================================================================
// Signature Dictionary
// =============================================================================

/// Reason recorded when the caller gives none
pub const DEFAULT_REASON: &str = "I approve of this document";

/// Bytes reserved for the DER-encoded CMS blob (written as twice as many hex digits)
pub const DEFAULT_SIGNATURE_RESERVE_BYTES: usize = 16384;

/// Digits reserved for each of the four /ByteRange numbers
pub const BYTE_RANGE_DIGITS: usize = 10;

/// Prefix of generated signature field names
pub const SIGNATURE_FIELD_PREFIX: &str = "Signature";

/// Annotation flag: print the annotation
pub const ANNOTATION_FLAG_PRINT: i64 = 4;

/// AcroForm /SigFlags: SignaturesExist | AppendOnly
pub const SIG_FLAGS_SIGNED: i64 = 3;

/// Guard against cyclic page trees and reference chains
pub const MAX_TREE_DEPTH: usize = 64;
