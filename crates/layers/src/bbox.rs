use foundation::{BoundingBox, Corner, LatLng, clamp_lat, clamp_lng, repair_box};
use serde::{Deserialize, Serialize};

use crate::overlay::{BoxOverlay, FitBounds};

/// One of the four numeric inputs next to the map.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoxField {
    #[serde(rename = "s_lat")]
    South,
    #[serde(rename = "w_lon")]
    West,
    #[serde(rename = "n_lat")]
    North,
    #[serde(rename = "e_lon")]
    East,
}

impl BoxField {
    pub const ALL: [BoxField; 4] = [
        BoxField::South,
        BoxField::West,
        BoxField::North,
        BoxField::East,
    ];

    /// Form field name sent to the server.
    pub fn form_name(self) -> &'static str {
        match self {
            BoxField::South => "s_lat",
            BoxField::West => "w_lon",
            BoxField::North => "n_lat",
            BoxField::East => "e_lon",
        }
    }

    pub fn is_latitude(self) -> bool {
        matches!(self, BoxField::South | BoxField::North)
    }
}

impl std::str::FromStr for BoxField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BoxField::ALL
            .into_iter()
            .find(|f| f.form_name() == s.trim())
            .ok_or_else(|| format!("unknown bounding box field '{s}'"))
    }
}

/// Values currently shown in the numeric inputs; `None` while a field is blank.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericFields {
    pub south: Option<f64>,
    pub west: Option<f64>,
    pub north: Option<f64>,
    pub east: Option<f64>,
}

impl NumericFields {
    pub fn from_box(b: &BoundingBox) -> Self {
        Self {
            south: Some(b.south),
            west: Some(b.west),
            north: Some(b.north),
            east: Some(b.east),
        }
    }

    pub fn get(&self, field: BoxField) -> Option<f64> {
        match field {
            BoxField::South => self.south,
            BoxField::West => self.west,
            BoxField::North => self.north,
            BoxField::East => self.east,
        }
    }

    fn slot(&mut self, field: BoxField) -> &mut Option<f64> {
        match field {
            BoxField::South => &mut self.south,
            BoxField::West => &mut self.west,
            BoxField::North => &mut self.north,
            BoxField::East => &mut self.east,
        }
    }

    /// `[west, south, east, north]` once every field holds a finite number.
    pub fn complete(&self) -> Option<[f64; 4]> {
        let raw = [self.west?, self.south?, self.east?, self.north?];
        raw.iter().all(|v| v.is_finite()).then_some(raw)
    }
}

/// Interactive editor for the step-2 bounding box.
///
/// Corner drags and numeric edits both funnel through clamping and
/// [`repair_box`], so the box is valid after every accepted edit and the
/// fields always mirror it.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBoxEditor {
    bbox: BoundingBox,
    fields: NumericFields,
    editable: bool,
    visible: bool,
}

impl BoundingBoxEditor {
    pub fn new(bbox: BoundingBox) -> Self {
        let bbox = clamp_box(bbox.as_array());
        Self {
            bbox,
            fields: NumericFields::from_box(&bbox),
            editable: false,
            visible: true,
        }
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    pub fn fields(&self) -> &NumericFields {
        &self.fields
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Hiding the box also leaves edit mode.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if !visible {
            self.editable = false;
        }
    }

    /// Moves `corner` to `to`, keeping the two edges it does not touch.
    ///
    /// Returns the new box, or `None` when the drag was ignored (read-only
    /// mode or a non-finite position).
    pub fn drag_corner(&mut self, corner: Corner, to: LatLng) -> Option<BoundingBox> {
        if !self.editable || !self.visible {
            tracing::debug!(corner = corner.as_str(), "drag ignored outside edit mode");
            return None;
        }
        if !to.is_finite() {
            return None;
        }

        let BoundingBox {
            west,
            south,
            east,
            north,
        } = self.bbox;
        let raw = match corner {
            Corner::Nw => [to.lng, south, east, to.lat],
            Corner::Ne => [west, south, to.lng, to.lat],
            Corner::Sw => [to.lng, to.lat, east, north],
            Corner::Se => [west, to.lat, to.lng, north],
        };
        Some(self.commit(raw))
    }

    /// Applies a numeric edit. The box only changes once all four fields
    /// hold finite values.
    pub fn set_field(&mut self, field: BoxField, value: Option<f64>) -> Option<BoundingBox> {
        *self.fields.slot(field) = value;
        let raw = self.fields.complete()?;
        Some(self.commit(raw))
    }

    /// Replaces the whole box, e.g. when a new boundary was uploaded.
    pub fn reset(&mut self, bbox: BoundingBox) {
        self.commit(bbox.as_array());
    }

    fn commit(&mut self, raw: [f64; 4]) -> BoundingBox {
        let repaired = clamp_box(raw);
        if repaired.as_array() != raw {
            tracing::debug!(?raw, ?repaired, "bounding box repaired");
        }
        self.bbox = repaired;
        self.fields = NumericFields::from_box(&repaired);
        repaired
    }

    /// `None` while the box is hidden.
    pub fn overlay(&self) -> Option<BoxOverlay> {
        self.visible
            .then(|| BoxOverlay::new(&self.bbox, self.editable))
    }

    pub fn fit_bounds(&self) -> FitBounds {
        FitBounds::new(&self.bbox)
    }
}

fn clamp_box(raw: [f64; 4]) -> BoundingBox {
    let [west, south, east, north] = raw;
    repair_box([
        clamp_lng(west),
        clamp_lat(south),
        clamp_lng(east),
        clamp_lat(north),
    ])
}
