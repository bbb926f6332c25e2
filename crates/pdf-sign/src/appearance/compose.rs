use super::{Caption, ImageSize, escape_literal};
use crate::constants::{STAMP_FONT_RESOURCE, STAMP_IMAGE_RESOURCE};
use crate::options::StampStyle;
use crate::types::{DocumentSpaceRect, EngineError, Result};

/// Generate the content stream of a stamp appearance.
///
/// The stream is drawn in form space: the stamp occupies `[0 0 width height]`.
/// It expects the image under `/Im0` and a Helvetica font under `/F1` in the
/// enclosing resources. Without an image the caption takes the whole stamp.
pub fn compose_stamp(
    width: f32,
    height: f32,
    image: Option<ImageSize>,
    caption: &Caption,
    style: &StampStyle,
) -> Result<String> {
    let bounds = DocumentSpaceRect::new(0.0, 0.0, width, height);
    if !(width.is_finite() && height.is_finite()) || !bounds.has_area() {
        return Err(EngineError::AppearanceRender(format!(
            "stamp area must be positive, got {} x {}",
            width, height
        )));
    }

    let mut ops = String::new();
    ops.push_str("q\n");

    let text_area = match image {
        Some(size) => {
            ops.push_str(&image_ops(&bounds.left_half().inset(style.padding), size));
            bounds.right_half().inset(style.padding)
        }
        None => bounds.inset(style.padding),
    };

    ops.push_str(&caption_ops(&text_area, caption, style));
    ops.push_str("Q\n");

    Ok(ops)
}

/// Image uniformly scaled into `area` and centered
fn image_ops(area: &DocumentSpaceRect, size: ImageSize) -> String {
    if !area.has_area() {
        return String::new();
    }

    let scale = (area.width / size.width as f32).min(area.height / size.height as f32);
    let drawn_width = size.width as f32 * scale;
    let drawn_height = size.height as f32 * scale;
    let x = area.x + (area.width - drawn_width) / 2.0;
    let y = area.y + (area.height - drawn_height) / 2.0;

    format!(
        "q {} 0 0 {} {} {} cm /{} Do Q\n",
        drawn_width, drawn_height, x, y, STAMP_IMAGE_RESOURCE
    )
}

/// Caption clipped to `area`, left-aligned, block centered vertically
fn caption_ops(area: &DocumentSpaceRect, caption: &Caption, style: &StampStyle) -> String {
    if caption.is_empty() || !area.has_area() {
        return String::new();
    }

    let font_size = style.font_size;
    let leading = style.leading();
    let block_height = font_size + (caption.lines.len() - 1) as f32 * leading;
    let first_baseline = area.center_y() + block_height / 2.0 - font_size;

    let mut ops = String::new();
    ops.push_str("q\n");
    ops.push_str(&format!(
        "{} {} {} {} re W n\n",
        area.x, area.y, area.width, area.height
    ));
    ops.push_str("0 g\n");
    ops.push_str(&format!(
        "BT /{} {} Tf {} TL {} {} Td\n",
        STAMP_FONT_RESOURCE, font_size, leading, area.x, first_baseline
    ));

    for (idx, line) in caption.lines.iter().enumerate() {
        if idx > 0 {
            ops.push_str("T* ");
        }
        ops.push_str(&format!("({}) Tj\n", escape_literal(line)));
    }

    ops.push_str("ET\nQ\n");
    ops
}
