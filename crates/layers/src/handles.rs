use foundation::{BoundingBox, Corner, LatLng};
use serde::Serialize;

pub const CORNER_MARKER_CLASS: &str = "corner-marker";

const CORNER_MARKER_HTML: &str = "<div style=\"width: 12px; height: 12px; background: #ff0000; \
border: 3px solid white; border-radius: 50%; cursor: move; \
box-shadow: 0 2px 4px rgba(0,0,0,0.3);\"></div>";

/// Leaflet `divIcon` options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerIcon {
    pub class_name: &'static str,
    pub html: &'static str,
    pub icon_size: [u32; 2],
    pub icon_anchor: [u32; 2],
}

impl MarkerIcon {
    pub fn corner() -> Self {
        Self {
            class_name: CORNER_MARKER_CLASS,
            html: CORNER_MARKER_HTML,
            icon_size: [18, 18],
            icon_anchor: [9, 9],
        }
    }
}

/// A draggable marker sitting on one corner of the box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CornerHandle {
    pub corner: Corner,
    pub position: LatLng,
    pub icon: MarkerIcon,
    pub draggable: bool,
}

pub fn corner_handle(corner: Corner, bbox: &BoundingBox) -> CornerHandle {
    CornerHandle {
        corner,
        position: bbox.corner(corner),
        icon: MarkerIcon::corner(),
        draggable: true,
    }
}

/// Handles in nw, ne, sw, se order.
pub fn corner_handles(bbox: &BoundingBox) -> Vec<CornerHandle> {
    Corner::ALL
        .iter()
        .map(|&c| corner_handle(c, bbox))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_sit_on_the_four_corners() {
        let b = BoundingBox::new(10.0, 20.0, 30.0, 40.0);
        let hs = corner_handles(&b);
        let positions: Vec<_> = hs.iter().map(|h| (h.corner, h.position)).collect();
        assert_eq!(
            positions,
            vec![
                (Corner::Nw, LatLng::new(40.0, 10.0)),
                (Corner::Ne, LatLng::new(40.0, 30.0)),
                (Corner::Sw, LatLng::new(20.0, 10.0)),
                (Corner::Se, LatLng::new(20.0, 30.0)),
            ]
        );
        assert!(hs.iter().all(|h| h.draggable));
    }

    #[test]
    fn corner_icon_geometry() {
        let icon = corner_handle(Corner::Se, &BoundingBox::new(0.0, 0.0, 1.0, 1.0)).icon;
        assert_eq!(icon.class_name, "corner-marker");
        assert_eq!(icon.icon_size, [18, 18]);
        assert_eq!(icon.icon_anchor, [9, 9]);
    }
}
