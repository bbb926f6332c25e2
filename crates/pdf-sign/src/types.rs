use crate::constants::{DEFAULT_PAGE_HEIGHT_PT, DEFAULT_PAGE_WIDTH_PT};
use crate::crypto::KeyStoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),
    #[error("Credential error: {0}")]
    Credential(#[from] KeyStoreError),
    #[error("Malformed document: {0}")]
    DocumentStructure(String),
    #[error("Appearance error: {0}")]
    AppearanceRender(String),
    #[error("Field name collision: {0}")]
    NameCollision(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Signing failed: {0}")]
    SigningFailure(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl EngineError {
    /// Whether the failure was caused by the caller's input (4xx-class) rather
    /// than an internal fault (5xx-class).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidInput(_)
                | EngineError::Credential(_)
                | EngineError::DocumentStructure(_)
                | EngineError::AppearanceRender(_)
                | EngineError::NameCollision(_)
                | EngineError::Config(_)
        )
    }
}

impl From<lopdf::Error> for EngineError {
    fn from(err: lopdf::Error) -> Self {
        EngineError::DocumentStructure(err.to_string())
    }
}

/// Caller mistakes in the placement list
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidInput {
    #[error("no signature placements were supplied")]
    EmptyPlacementList,
    #[error("placement on page {page} has a non-positive size ({width} x {height})")]
    NonPositiveSize { page: u32, width: f32, height: f32 },
    #[error("page {page} does not exist (document has {page_count} pages)")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("placement on page {page} is outside the page: {detail}")]
    InvalidGeometry { page: u32, detail: String },
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// A requested signature location in caller (screen) space.
///
/// The origin is the top-left corner of the page and Y grows downwards.
/// Pages are numbered from 1.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PlacementRequest {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub page: u32,
    /// Field name, honored when creating unsigned placeholder fields
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            alias = "signatureName",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub field_name: Option<String>,
}

impl PlacementRequest {
    pub fn new(page: u32, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            page,
            field_name: None,
        }
    }

    pub fn with_field_name(mut self, name: impl Into<String>) -> Self {
        self.field_name = Some(name.into());
        self
    }
}

/// A rectangle in PDF user space (origin bottom-left, Y grows upwards)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DocumentSpaceRect {
    /// X position (left edge)
    pub x: f32,
    /// Y position (bottom edge)
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl DocumentSpaceRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge x coordinate
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Top edge y coordinate
    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Left half, split along the vertical line through the center
    pub fn left_half(&self) -> Self {
        Self::new(self.x, self.y, self.width / 2.0, self.height)
    }

    /// Right half, split along the vertical line through the center
    pub fn right_half(&self) -> Self {
        Self::new(self.center_x(), self.y, self.width / 2.0, self.height)
    }

    /// Shrink by `amount` on every side, never below zero size
    pub fn inset(&self, amount: f32) -> Self {
        let width = (self.width - 2.0 * amount).max(0.0);
        let height = (self.height - 2.0 * amount).max(0.0);
        Self::new(self.x + amount, self.y + amount, width, height)
    }

    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// The visible page area (MediaBox) in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    /// Lower-left x of the MediaBox
    pub llx: f32,
    /// Lower-left y of the MediaBox
    pub lly: f32,
    pub width: f32,
    pub height: f32,
}

impl PageBox {
    pub fn new(llx: f32, lly: f32, width: f32, height: f32) -> Self {
        Self {
            llx,
            lly,
            width,
            height,
        }
    }

    /// Page box with the origin at (0, 0)
    pub fn sized(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// US Letter, used when a page carries no usable MediaBox
    pub fn letter() -> Self {
        Self::sized(DEFAULT_PAGE_WIDTH_PT, DEFAULT_PAGE_HEIGHT_PT)
    }
}

/// The output of a signing operation
#[derive(Debug, Clone, PartialEq)]
pub struct SignedDocument {
    /// Complete PDF bytes: the original file followed by the appended revision
    pub bytes: Vec<u8>,
    /// Name of the signature field that carries the cryptographic signature
    pub field_name: String,
    /// Number of decorative stamps drawn into page content
    pub decorative_stamps: usize,
}

impl SignedDocument {
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Summary of a signature field found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureFieldInfo {
    /// Fully qualified field name
    pub name: String,
    /// Whether the field already holds a signature value
    pub signed: bool,
}
