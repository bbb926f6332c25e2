//! Placement ordering and selection of the signing target
//!
//! Placements are sorted by page number with a stable sort, so placements on
//! the same page keep their input order. The first placement after sorting
//! carries the cryptographic signature; every other placement is drawn as a
//! decorative stamp.

use crate::types::{InvalidInput, PlacementRequest, Result};

/// Placements split into the single signing target and the decorative rest
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedPlacements<'a> {
    pub target: &'a PlacementRequest,
    /// Remaining placements, in page order
    pub decorative: Vec<&'a PlacementRequest>,
}

impl OrderedPlacements<'_> {
    /// Total number of placements, target included
    pub fn total(&self) -> usize {
        self.decorative.len() + 1
    }
}

/// Sort placements by page and designate the signing target.
pub fn order_placements(placements: &[PlacementRequest]) -> Result<OrderedPlacements<'_>> {
    let mut sorted: Vec<&PlacementRequest> = placements.iter().collect();
    // Vec::sort_by_key is stable
    sorted.sort_by_key(|p| p.page);

    let mut iter = sorted.into_iter();
    let target = iter.next().ok_or(InvalidInput::EmptyPlacementList)?;

    Ok(OrderedPlacements {
        target,
        decorative: iter.collect(),
    })
}
