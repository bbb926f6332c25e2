//! Coordinate transformation between caller space and PDF user space
//!
//! Callers describe placements with the origin at the top-left corner of the
//! page and Y growing downwards. PDF user space has its origin at the
//! lower-left corner of the MediaBox and Y growing upwards:
//!
//! ```text
//! x' = llx + x
//! y' = lly + (H - y - h)
//! ```
//!
//! Flipping twice with the same page height returns the original `y`.

use crate::constants::GEOMETRY_TOLERANCE_PT;
use crate::types::{DocumentSpaceRect, InvalidInput, PageBox, PlacementRequest, Result};

/// What to do with a rectangle that does not fit inside the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundsPolicy {
    /// Fail with [`InvalidInput::InvalidGeometry`]
    #[default]
    Reject,
    /// Accept any rectangle with a positive size
    Allow,
}

/// Mirror a top-edge offset into a bottom-edge offset (or back).
pub fn flip_y(y: f32, height: f32, page_height: f32) -> f32 {
    page_height - y - height
}

/// Convert a caller-space placement into PDF user space.
///
/// The caller's record is only read; the result is a new value.
pub fn to_document_space(
    request: &PlacementRequest,
    page: &PageBox,
    bounds: BoundsPolicy,
) -> Result<DocumentSpaceRect> {
    let values = [
        ("x", request.x),
        ("y", request.y),
        ("width", request.width),
        ("height", request.height),
    ];
    if let Some((field, value)) = values.iter().find(|(_, v)| !v.is_finite()) {
        return Err(InvalidInput::InvalidGeometry {
            page: request.page,
            detail: format!("{} is {}", field, value),
        }
        .into());
    }
    if request.width <= 0.0 || request.height <= 0.0 {
        return Err(InvalidInput::NonPositiveSize {
            page: request.page,
            width: request.width,
            height: request.height,
        }
        .into());
    }

    let rect = DocumentSpaceRect::new(
        page.llx + request.x,
        page.lly + flip_y(request.y, request.height, page.height),
        request.width,
        request.height,
    );

    if bounds == BoundsPolicy::Reject {
        check_within_page(request, page)?;
    }

    Ok(rect)
}

/// Convert a PDF user-space rectangle back into caller space.
pub fn to_caller_space(rect: &DocumentSpaceRect, page: &PageBox) -> (f32, f32) {
    let x = rect.x - page.llx;
    let y = flip_y(rect.y - page.lly, rect.height, page.height);
    (x, y)
}

fn check_within_page(request: &PlacementRequest, page: &PageBox) -> Result<()> {
    let tol = GEOMETRY_TOLERANCE_PT;
    let right = request.x + request.width;
    let bottom = request.y + request.height;

    let detail = if request.x < -tol || request.y < -tol {
        Some(format!(
            "origin ({}, {}) lies before the top-left corner",
            request.x, request.y
        ))
    } else if right > page.width + tol {
        Some(format!(
            "right edge {} exceeds page width {}",
            right, page.width
        ))
    } else if bottom > page.height + tol {
        Some(format!(
            "bottom edge {} exceeds page height {}",
            bottom, page.height
        ))
    } else {
        None
    };

    match detail {
        Some(detail) => Err(InvalidInput::InvalidGeometry {
            page: request.page,
            detail,
        }
        .into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EngineError;
    use proptest::prelude::*;

    fn letter() -> PageBox {
        PageBox::sized(612.0, 792.0)
    }

    #[test]
    fn test_flip_top_left_corner() {
        let request = PlacementRequest::new(1, 0.0, 0.0, 100.0, 50.0);
        let rect = to_document_space(&request, &letter(), BoundsPolicy::Reject).unwrap();

        assert!((rect.x - 0.0).abs() < 0.01);
        assert!((rect.y - 742.0).abs() < 0.01);
        assert!((rect.top() - 792.0).abs() < 0.01);
    }

    #[test]
    fn test_flip_bottom_edge() {
        let request = PlacementRequest::new(1, 50.0, 742.0, 100.0, 50.0);
        let rect = to_document_space(&request, &letter(), BoundsPolicy::Reject).unwrap();

        assert!((rect.x - 50.0).abs() < 0.01);
        assert!(rect.y.abs() < 0.01);
    }

    #[test]
    fn test_media_box_offset_applied() {
        let page = PageBox::new(10.0, 20.0, 500.0, 700.0);
        let request = PlacementRequest::new(1, 5.0, 100.0, 50.0, 30.0);
        let rect = to_document_space(&request, &page, BoundsPolicy::Reject).unwrap();

        assert!((rect.x - 15.0).abs() < 0.01);
        assert!((rect.y - (20.0 + 700.0 - 100.0 - 30.0)).abs() < 0.01);

        let (x, y) = to_caller_space(&rect, &page);
        assert!((x - 5.0).abs() < 0.01);
        assert!((y - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_non_positive_size_rejected() {
        let request = PlacementRequest::new(2, 10.0, 10.0, 0.0, 20.0);
        let err = to_document_space(&request, &letter(), BoundsPolicy::Allow).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidInput(InvalidInput::NonPositiveSize { page: 2, .. })
        ));

        let request = PlacementRequest::new(1, 10.0, 10.0, 20.0, -1.0);
        assert!(to_document_space(&request, &letter(), BoundsPolicy::Allow).is_err());
    }

    #[test]
    fn test_non_finite_values_reported_by_field() {
        let request = PlacementRequest::new(3, f32::NAN, 10.0, 50.0, 20.0);
        let err = to_document_space(&request, &letter(), BoundsPolicy::Allow).unwrap_err();
        match err {
            EngineError::InvalidInput(InvalidInput::InvalidGeometry { page, detail }) => {
                assert_eq!(page, 3);
                assert_eq!(detail, "x is NaN");
            }
            other => panic!("unexpected error {:?}", other),
        }

        let request = PlacementRequest::new(1, 10.0, f32::INFINITY, 50.0, 20.0);
        let err = to_document_space(&request, &letter(), BoundsPolicy::Allow).unwrap_err();
        assert!(err.to_string().contains("y is inf"));
    }

    #[test]
    fn test_out_of_bounds_rejected_by_default() {
        let request = PlacementRequest::new(1, 600.0, 10.0, 100.0, 20.0);
        let err = to_document_space(&request, &letter(), BoundsPolicy::default()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidInput(InvalidInput::InvalidGeometry { page: 1, .. })
        ));

        let request = PlacementRequest::new(1, 10.0, -5.0, 100.0, 20.0);
        assert!(to_document_space(&request, &letter(), BoundsPolicy::Reject).is_err());

        let request = PlacementRequest::new(1, 10.0, 780.0, 100.0, 20.0);
        assert!(to_document_space(&request, &letter(), BoundsPolicy::Reject).is_err());
    }

    #[test]
    fn test_out_of_bounds_allowed_when_requested() {
        let request = PlacementRequest::new(1, 600.0, 780.0, 100.0, 20.0);
        let rect = to_document_space(&request, &letter(), BoundsPolicy::Allow).unwrap();
        assert!(rect.y < 0.0);
    }

    #[test]
    fn test_exact_fit_within_tolerance() {
        let request = PlacementRequest::new(1, 0.0, 0.0, 612.005, 792.0);
        assert!(to_document_space(&request, &letter(), BoundsPolicy::Reject).is_ok());
    }

    proptest! {
        #[test]
        fn flip_is_an_involution(
            y in -1000.0f32..1000.0,
            h in 0.1f32..500.0,
            page_height in 1.0f32..2000.0,
        ) {
            let back = flip_y(flip_y(y, h, page_height), h, page_height);
            prop_assert!((back - y).abs() < 0.01);
        }

        #[test]
        fn caller_space_round_trip(
            x in 0.0f32..300.0,
            y in 0.0f32..400.0,
            w in 1.0f32..300.0,
            h in 1.0f32..390.0,
        ) {
            let page = PageBox::new(3.0, 7.0, 612.0, 792.0);
            let request = PlacementRequest::new(1, x, y, w, h);
            let rect = to_document_space(&request, &page, BoundsPolicy::Reject).unwrap();
            prop_assert!((rect.y - (7.0 + 792.0 - y - h)).abs() < 0.01);

            let (cx, cy) = to_caller_space(&rect, &page);
            prop_assert!((cx - x).abs() < 0.01);
            prop_assert!((cy - y).abs() < 0.01);
        }
    }
}
