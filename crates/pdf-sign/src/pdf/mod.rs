//! PDF document model
//!
//! [`DocumentModel`] is the capability the engine needs from a paged
//! document. [`PdfDocument`] implements it on top of lopdf and writes every
//! change as an incremental update appended to the untouched input bytes.

mod document;
mod fields;
mod stamp;
pub mod writer;

pub use document::PdfDocument;
pub use fields::FieldInfo;

use crate::appearance::{Caption, StampImage};
use crate::options::StampStyle;
use crate::types::{DocumentSpaceRect, PageBox, Result, SignatureFieldInfo};
use chrono::{DateTime, FixedOffset};

/// What a stamp looks like
#[derive(Debug, Clone, Copy)]
pub struct StampContent<'a> {
    pub image: Option<&'a StampImage>,
    pub caption: &'a Caption,
    pub style: &'a StampStyle,
}

/// Metadata written into the signature dictionary
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureValue {
    pub signer_name: Option<String>,
    pub reason: Option<String>,
    pub location: Option<String>,
    pub contact_info: Option<String>,
    pub signed_at: DateTime<FixedOffset>,
    /// Bytes reserved for the DER-encoded CMS blob
    pub reserve_bytes: usize,
}

/// A signature field to create
#[derive(Debug, Clone)]
pub struct SignatureFieldSpec<'a> {
    /// 1-based page number
    pub page: u32,
    pub rect: DocumentSpaceRect,
    pub name: String,
    /// Normal appearance; `None` leaves the widget blank
    pub appearance: Option<StampContent<'a>>,
    /// Reserve a signature value for the field; `None` creates an empty field
    pub signature: Option<SignatureValue>,
}

/// Location of the reserved signature value inside an incremental update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignaturePlaceholder {
    /// Offset of the `[` opening the /ByteRange array
    pub byte_range_offset: usize,
    /// Bytes between the brackets of the /ByteRange array
    pub byte_range_width: usize,
    /// Offset of the `<` opening the /Contents hex string
    pub contents_offset: usize,
    /// Length of the /Contents hex string, brackets included
    pub contents_len: usize,
}

/// Complete output file: original bytes plus the appended revision
#[derive(Debug, Clone)]
pub struct IncrementalUpdate {
    pub bytes: Vec<u8>,
    pub placeholder: Option<SignaturePlaceholder>,
}

/// Operations the signing engine performs on a paged document
pub trait DocumentModel {
    fn page_count(&self) -> u32;

    /// Visible area of a 1-based page
    fn page_box(&self, page: u32) -> Result<PageBox>;

    /// Signature fields currently present, in document order
    fn signature_fields(&self) -> Result<Vec<SignatureFieldInfo>>;

    /// Qualified names of every form field currently present
    fn field_names(&self) -> Result<Vec<String>>;

    /// Draw a stamp into the page content at `rect`
    fn draw_stamp(&mut self, page: u32, rect: &DocumentSpaceRect, stamp: StampContent<'_>)
    -> Result<()>;

    /// Create a signature field with its widget annotation
    fn add_signature_field(&mut self, field: SignatureFieldSpec<'_>) -> Result<()>;

    /// Serialize the original bytes followed by every change as one revision
    fn write_incremental(&self) -> Result<IncrementalUpdate>;
}
