use serde::{Deserialize, Serialize};

use crate::geo::LatLng;

/// Axis-aligned geographic box `[west, south, east, north]` in degrees.
///
/// Invariant: `west <= east` and `south <= north`. Every constructor other than
/// the raw field literal goes through [`repair_box`], so a box built from
/// arbitrary edits is never inverted.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

/// One of the four draggable corners of a [`BoundingBox`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Corner {
    Nw,
    Ne,
    Sw,
    Se,
}

impl Corner {
    pub const ALL: [Corner; 4] = [Corner::Nw, Corner::Ne, Corner::Sw, Corner::Se];

    pub fn opposite(self) -> Corner {
        match self {
            Corner::Nw => Corner::Se,
            Corner::Ne => Corner::Sw,
            Corner::Sw => Corner::Ne,
            Corner::Se => Corner::Nw,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Corner::Nw => "nw",
            Corner::Ne => "ne",
            Corner::Sw => "sw",
            Corner::Se => "se",
        }
    }
}

impl std::str::FromStr for Corner {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nw" => Ok(Corner::Nw),
            "ne" => Ok(Corner::Ne),
            "sw" => Ok(Corner::Sw),
            "se" => Ok(Corner::Se),
            other => Err(format!("unknown corner '{other}', expected nw|ne|sw|se")),
        }
    }
}

/// Reorders four independently edited values into a valid box.
///
/// Input is `[west, south, east, north]` in any order per axis. Total and
/// idempotent: never rejects, never fails.
pub fn repair_box(raw: [f64; 4]) -> BoundingBox {
    let [west, south, east, north] = raw;
    BoundingBox {
        west: west.min(east),
        south: south.min(north),
        east: west.max(east),
        north: south.max(north),
    }
}

impl BoundingBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        repair_box([west, south, east, north])
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }

    pub fn is_valid(&self) -> bool {
        self.west <= self.east && self.south <= self.north
    }

    pub fn corner(&self, corner: Corner) -> LatLng {
        match corner {
            Corner::Nw => LatLng::new(self.north, self.west),
            Corner::Ne => LatLng::new(self.north, self.east),
            Corner::Sw => LatLng::new(self.south, self.west),
            Corner::Se => LatLng::new(self.south, self.east),
        }
    }

    /// Corner positions in handle order: nw, ne, sw, se.
    pub fn corners(&self) -> [(Corner, LatLng); 4] {
        Corner::ALL.map(|c| (c, self.corner(c)))
    }

    /// Closed polygon ring (counter-clockwise, first vertex repeated).
    pub fn as_polygon(&self) -> Vec<LatLng> {
        vec![
            self.corner(Corner::Sw),
            self.corner(Corner::Se),
            self.corner(Corner::Ne),
            self.corner(Corner::Nw),
            self.corner(Corner::Sw),
        ]
    }

    /// Leaflet-style `[[south, west], [north, east]]`.
    pub fn to_lat_lng_bounds(&self) -> [[f64; 2]; 2] {
        [[self.south, self.west], [self.north, self.east]]
    }

    pub fn contains(&self, p: LatLng) -> bool {
        (self.west..=self.east).contains(&p.lng) && (self.south..=self.north).contains(&p.lat)
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(raw: [f64; 4]) -> Self {
        repair_box(raw)
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        b.as_array()
    }
}

/// Running min/max over positions; `None` until the first position arrives.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BoundsAccumulator {
    bounds: Option<BoundingBox>,
}

impl BoundsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, p: LatLng) {
        self.bounds = Some(match self.bounds {
            None => BoundingBox {
                west: p.lng,
                south: p.lat,
                east: p.lng,
                north: p.lat,
            },
            Some(b) => BoundingBox {
                west: b.west.min(p.lng),
                south: b.south.min(p.lat),
                east: b.east.max(p.lng),
                north: b.north.max(p.lat),
            },
        });
    }

    pub fn finish(self) -> Option<BoundingBox> {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repair_reorders_each_axis() {
        let b = repair_box([30.0, 40.0, 10.0, 20.0]);
        assert_eq!(b.as_array(), [10.0, 20.0, 30.0, 40.0]);
        assert!(b.is_valid());
    }

    #[test]
    fn repair_is_idempotent() {
        let once = repair_box([5.0, -1.0, -5.0, 1.0]);
        let twice = repair_box(once.as_array());
        assert_eq!(once, twice);
    }

    #[test]
    fn repair_all_orderings_of_four_values_are_valid() {
        let values = [3.0, -7.5, 12.25, 0.0];
        let mut seen = 0;
        for a in 0..4 {
            for b in 0..4 {
                for c in 0..4 {
                    for d in 0..4 {
                        let idx = [a, b, c, d];
                        let mut sorted = idx;
                        sorted.sort_unstable();
                        if sorted != [0, 1, 2, 3] {
                            continue;
                        }
                        seen += 1;
                        let raw = idx.map(|i| values[i]);
                        let b = repair_box(raw);
                        assert!(b.is_valid(), "{raw:?} -> {b:?}");
                        assert_eq!(repair_box(b.as_array()), b);
                    }
                }
            }
        }
        assert_eq!(seen, 24);
    }

    #[test]
    fn corners_follow_handle_layout() {
        let b = BoundingBox::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(b.corner(Corner::Nw), LatLng::new(40.0, 10.0));
        assert_eq!(b.corner(Corner::Se), LatLng::new(20.0, 30.0));
        assert_eq!(b.corners()[1].0, Corner::Ne);
        assert_eq!(b.to_lat_lng_bounds(), [[20.0, 10.0], [40.0, 30.0]]);
    }

    #[test]
    fn serializes_as_west_south_east_north_array() {
        let b = BoundingBox::new(10.0, 20.0, 30.0, 40.0);
        let json = serde_json::to_string(&b).unwrap();
        assert_eq!(json, "[10.0,20.0,30.0,40.0]");
        let back: BoundingBox = serde_json::from_str("[30,40,10,20]").unwrap();
        assert_eq!(back, b);
    }

    #[test]
    fn accumulator_tracks_extent() {
        let mut acc = BoundsAccumulator::new();
        assert_eq!(acc.finish(), None);
        acc.push(LatLng::new(20.0, 10.0));
        acc.push(LatLng::new(-5.0, 30.0));
        let b = acc.finish().unwrap();
        assert_eq!(b.as_array(), [10.0, -5.0, 30.0, 20.0]);
        assert!(b.contains(LatLng::new(0.0, 15.0)));
    }

    #[test]
    fn corner_parses_case_insensitively() {
        assert_eq!("NW".parse::<Corner>().unwrap(), Corner::Nw);
        assert!("north".parse::<Corner>().is_err());
        assert_eq!(Corner::Ne.opposite(), Corner::Sw);
    }
}
