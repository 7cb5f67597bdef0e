use foundation::{BoundingBox, BoundsAccumulator, Centroid, LatLng};
use formats::{GeoJson, Geometry};

/// Which vertices a walk visits.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RingSelection {
    /// Outer ring of each polygon only; holes are skipped.
    OuterOnly,
    /// Every ring, holes included.
    All,
}

/// Visits every position of `geom` in document order.
pub fn walk_positions(geom: &Geometry, rings: RingSelection, visit: &mut impl FnMut(LatLng)) {
    match geom {
        Geometry::Point(p) => visit(*p),
        Geometry::MultiPoint(ps) | Geometry::LineString(ps) => ps.iter().copied().for_each(visit),
        Geometry::MultiLineString(lines) => lines
            .iter()
            .flat_map(|l| l.iter().copied())
            .for_each(visit),
        Geometry::Polygon(poly) => walk_polygon(poly, rings, visit),
        Geometry::MultiPolygon(polys) => {
            for poly in polys {
                walk_polygon(poly, rings, visit);
            }
        }
        Geometry::GeometryCollection(members) => {
            for member in members {
                walk_positions(member, rings, visit);
            }
        }
    }
}

fn walk_polygon(poly: &[Vec<LatLng>], rings: RingSelection, visit: &mut impl FnMut(LatLng)) {
    let take = match rings {
        RingSelection::OuterOnly => 1,
        RingSelection::All => poly.len(),
    };
    poly.iter()
        .take(take)
        .flat_map(|r| r.iter().copied())
        .for_each(visit);
}

pub struct SpatialAnalysis;

impl SpatialAnalysis {
    /// Arithmetic mean of the collection's coordinate pairs.
    ///
    /// Only feature collections with at least one feature qualify. Polygons
    /// contribute their outer ring. `None` when nothing was visited.
    pub fn centroid(doc: &GeoJson) -> Option<Centroid> {
        let fc = doc.as_feature_collection()?;
        if fc.features.is_empty() {
            return None;
        }

        let mut sum_lat = 0.0;
        let mut sum_lng = 0.0;
        let mut count = 0usize;
        for geom in fc.features.iter().filter_map(|f| f.geometry.as_ref()) {
            walk_positions(geom, RingSelection::OuterOnly, &mut |p| {
                sum_lat += p.lat;
                sum_lng += p.lng;
                count += 1;
            });
        }

        if count == 0 {
            return None;
        }
        let n = count as f64;
        Some(LatLng::new(sum_lat / n, sum_lng / n))
    }

    /// Minimal enclosing box over every position of the document.
    pub fn bounding_box(doc: &GeoJson) -> Option<BoundingBox> {
        let mut acc = BoundsAccumulator::new();
        for geom in doc.geometries() {
            walk_positions(geom, RingSelection::All, &mut |p| acc.push(p));
        }
        acc.finish()
    }

    pub fn position_count(doc: &GeoJson, rings: RingSelection) -> usize {
        let mut count = 0usize;
        for geom in doc.geometries() {
            walk_positions(geom, rings, &mut |_| count += 1);
        }
        count
    }
}

pub fn centroid(doc: &GeoJson) -> Option<Centroid> {
    SpatialAnalysis::centroid(doc)
}

pub fn bounding_box(doc: &GeoJson) -> Option<BoundingBox> {
    SpatialAnalysis::bounding_box(doc)
}
