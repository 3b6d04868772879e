//! Detection overlay: native-space detections → displayed-space boxes.
//!
//! Every detection maps to exactly one box, in input order, so an index into
//! the output also indexes the payload's detection list. Nothing is filtered or
//! clipped here; skipping off-screen boxes is the renderer's call.

#[cfg(test)]
#[path = "overlay_test.rs"]
mod overlay_test;

use payload::Detection;
use serde::Serialize;

use crate::geometry::{Point, ScaleFactors, map_rect};

/// A detection positioned in displayed space, ready for painting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayedBox {
    pub left: f64,
    pub top: f64,
    /// Negative for inverted source bounds; renderers should treat as empty.
    pub width: f64,
    pub height: f64,
    /// Category label, or `"Region N"` for unlabelled detections.
    pub label: String,
}

impl DisplayedBox {
    /// Whether a displayed-space point falls inside this box (edges inclusive).
    ///
    /// Zero or negative-size boxes contain nothing.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && point.x >= self.left
            && point.x <= self.left + self.width
            && point.y >= self.top
            && point.y <= self.top + self.height
    }
}

/// Label for the detection at `index`: its category, or a 1-based ordinal.
#[must_use]
pub fn region_label(index: usize, category: Option<&str>) -> String {
    match category {
        Some(c) if !c.is_empty() => c.to_owned(),
        _ => format!("Region {}", index + 1),
    }
}

/// Map every detection into displayed space using `scale`.
#[must_use]
pub fn map_detections(detections: &[Detection], scale: ScaleFactors) -> Vec<DisplayedBox> {
    detections
        .iter()
        .enumerate()
        .map(|(index, detection)| {
            let mapped = map_rect(detection.bounds, scale);
            DisplayedBox {
                left: mapped.min_x,
                top: mapped.min_y,
                width: mapped.width(),
                height: mapped.height(),
                label: region_label(index, detection.category.as_deref()),
            }
        })
        .collect()
}

/// Index of the topmost box under `point`, if any.
///
/// Boxes are painted in order, so later boxes sit on top and win.
#[must_use]
pub fn hit_test(boxes: &[DisplayedBox], point: Point) -> Option<usize> {
    boxes.iter().rposition(|b| b.contains(point))
}
