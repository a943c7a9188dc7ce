//! Region selection: keep the detections of one layout class

use pagetext_common::{Detection, TextRegion};
use tracing::debug;

/// Keep detections whose class equals `target_class`, in input order.
///
/// Overlapping boxes are kept as-is; no deduplication happens here.
#[must_use]
pub fn select(detections: &[Detection], target_class: u32) -> Vec<TextRegion> {
    let regions: Vec<TextRegion> = detections
        .iter()
        .filter(|d| d.class_id == target_class)
        .map(TextRegion::from)
        .collect();

    debug!(
        "Selected {} of {} detections with class {}",
        regions.len(),
        detections.len(),
        target_class
    );
    regions
}
