//! Visual stamp composition
//!
//! A stamp is split along its vertical center line:
//! - left half: the stamp image, uniformly scaled to fit and centered
//! - right half: the caption, left-aligned and vertically centered
//!
//! The same composition serves the signature widget's appearance and the
//! decorative stamps drawn into page content.

mod caption;
mod compose;
mod stamp_image;

pub use caption::{Caption, encode_text_string, escape_literal};
pub use compose::compose_stamp;
pub use stamp_image::{ImageSize, StampImage};
