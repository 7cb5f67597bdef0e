use foundation::BoundingBox;
use serde::Serialize;

use crate::handles::{CornerHandle, corner_handles};
use crate::layer::{Layer, LayerId};
use crate::symbology::PathStyle;

pub const EDIT_HINT: &str = "Drag corners to resize bounding box.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub text: String,
    pub direction: &'static str,
    pub permanent: bool,
}

impl Tooltip {
    pub fn for_box(bbox: &BoundingBox, editable: bool) -> Self {
        let text = if editable {
            EDIT_HINT.to_string()
        } else {
            format!(
                "Bounding Box:\nNorth: {:.6}°\nSouth: {:.6}°\nEast: {:.6}°\nWest: {:.6}°",
                bbox.north, bbox.south, bbox.east, bbox.west
            )
        };
        Self {
            text,
            direction: "top",
            permanent: false,
        }
    }
}

/// Render model of the bounding-box rectangle and, when editable, its handles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxOverlay {
    pub id: LayerId,
    /// `[[south, west], [north, east]]`.
    pub bounds: [[f64; 2]; 2],
    pub style: PathStyle,
    pub tooltip: Tooltip,
    pub handles: Vec<CornerHandle>,
    pub editable: bool,
}

impl BoxOverlay {
    pub fn new(bbox: &BoundingBox, editable: bool) -> Self {
        Self {
            id: LayerId::BOUNDING_BOX,
            bounds: bbox.to_lat_lng_bounds(),
            style: PathStyle::bounding_box(editable),
            tooltip: Tooltip::for_box(bbox, editable),
            handles: if editable {
                corner_handles(bbox)
            } else {
                Vec::new()
            },
            editable,
        }
    }
}

impl Layer for BoxOverlay {
    fn id(&self) -> LayerId {
        self.id
    }

    fn is_interactive(&self) -> bool {
        self.editable
    }
}

/// Outline of the uploaded boundary; the host supplies the geometry itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryOverlay {
    pub id: LayerId,
    pub style: PathStyle,
}

impl Default for BoundaryOverlay {
    fn default() -> Self {
        Self {
            id: LayerId::BOUNDARY,
            style: PathStyle::boundary(),
        }
    }
}

impl Layer for BoundaryOverlay {
    fn id(&self) -> LayerId {
        self.id
    }
}

/// Viewport request: show the whole box without zooming in too far.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitBounds {
    pub bounds: [[f64; 2]; 2],
    pub padding: [u32; 2],
    pub max_zoom: u8,
}

impl FitBounds {
    pub fn new(bbox: &BoundingBox) -> Self {
        Self {
            bounds: bbox.to_lat_lng_bounds(),
            padding: [20, 20],
            max_zoom: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn read_only_tooltip_lists_edges_to_six_places() {
        let b = BoundingBox::new(-1.5, 2.25, 3.0, 4.123456789);
        let overlay = BoxOverlay::new(&b, false);
        assert_eq!(
            overlay.tooltip.text,
            "Bounding Box:\nNorth: 4.123457°\nSouth: 2.250000°\nEast: 3.000000°\nWest: -1.500000°"
        );
        assert!(overlay.handles.is_empty());
        assert!(!overlay.is_interactive());
        assert_eq!(overlay.bounds, [[2.25, -1.5], [4.123456789, 3.0]]);
    }

    #[test]
    fn editable_overlay_carries_handles_and_hint() {
        let b = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let overlay = BoxOverlay::new(&b, true);
        assert_eq!(overlay.tooltip.text, EDIT_HINT);
        assert_eq!(overlay.handles.len(), 4);
        assert!(overlay.is_interactive());
    }

    #[test]
    fn fit_bounds_pads_and_caps_zoom() {
        let fit = FitBounds::new(&BoundingBox::new(10.0, 20.0, 30.0, 40.0));
        assert_eq!(fit.bounds, [[20.0, 10.0], [40.0, 30.0]]);
        assert_eq!(fit.padding, [20, 20]);
        assert_eq!(fit.max_zoom, 10);
    }
}
