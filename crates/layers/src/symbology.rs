use serde::Serialize;

/// Leaflet `pathOptions` for rectangles and GeoJSON outlines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathStyle {
    pub color: &'static str,
    pub fill_color: &'static str,
    pub fill_opacity: f32,
    pub weight: f32,
    /// SVG dash pattern; `None` draws a solid stroke.
    pub dash_array: Option<&'static str>,
}

impl PathStyle {
    pub const fn new(
        color: &'static str,
        fill_opacity: f32,
        weight: f32,
        dash_array: Option<&'static str>,
    ) -> Self {
        Self {
            color,
            fill_color: color,
            fill_opacity,
            weight,
            dash_array,
        }
    }

    /// Uploaded boundary outline.
    pub const fn boundary() -> Self {
        Self::new("#3388ff", 0.2, 2.0, None)
    }

    pub const fn bounding_box(editable: bool) -> Self {
        if editable {
            Self::new("#ff0000", 0.1, 2.0, Some("5, 5"))
        } else {
            Self::new("#ff7800", 0.1, 2.0, Some("10, 10"))
        }
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self::boundary()
    }
}

#[cfg(test)]
mod tests {
    use super::PathStyle;

    #[test]
    fn editable_box_is_red_with_short_dashes() {
        let s = PathStyle::bounding_box(true);
        assert_eq!(s.color, "#ff0000");
        assert_eq!(s.fill_color, "#ff0000");
        assert_eq!(s.dash_array, Some("5, 5"));

        let s = PathStyle::bounding_box(false);
        assert_eq!(s.color, "#ff7800");
        assert_eq!(s.dash_array, Some("10, 10"));
        assert_eq!(s.weight, 2.0);
    }
}
