use foundation::LatLng;
use serde_json::{Map, Value};
use thiserror::Error;

/// Every `type` tag a GeoJSON document may carry at its root.
pub const GEOJSON_TYPES: [&str; 9] = [
    "FeatureCollection",
    "Feature",
    "Point",
    "LineString",
    "Polygon",
    "MultiPoint",
    "MultiLineString",
    "MultiPolygon",
    "GeometryCollection",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(LatLng),
    MultiPoint(Vec<LatLng>),
    LineString(Vec<LatLng>),
    MultiLineString(Vec<Vec<LatLng>>),
    /// Rings; the first one is the outer ring, the rest are holes.
    Polygon(Vec<Vec<LatLng>>),
    MultiPolygon(Vec<Vec<Vec<LatLng>>>),
    GeometryCollection(Vec<Geometry>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<String>,
    /// Insertion-ordered (`serde_json` is built with `preserve_order`).
    pub properties: Map<String, Value>,
    /// `None` for null geometries and for geometries that failed to parse.
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

/// A parsed boundary document.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoJson {
    FeatureCollection(FeatureCollection),
    Feature(Feature),
    Geometry(Geometry),
}

#[derive(Debug, Error)]
pub enum GeoJsonError {
    #[error("file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("not a GeoJSON document (missing or unknown \"type\")")]
    NotGeoJson,
    #[error("invalid GeoJSON {kind}: {reason}")]
    Invalid { kind: &'static str, reason: String },
    #[error("You can only upload GeoJSON files")]
    MediaType(String),
}

/// Media types a boundary file may declare.
pub const GEOJSON_MEDIA_TYPES: [&str; 2] = ["application/geo+json", "application/json"];

/// Rejects files whose declared type is not GeoJSON. Parameters such as
/// `charset` are ignored.
pub fn check_media_type(media_type: &str) -> Result<(), GeoJsonError> {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if GEOJSON_MEDIA_TYPES.contains(&essence.as_str()) {
        Ok(())
    } else {
        Err(GeoJsonError::MediaType(media_type.to_string()))
    }
}

/// Structural check only: an object whose `type` is one of [`GEOJSON_TYPES`].
pub fn is_valid_geojson(value: &Value) -> bool {
    value
        .as_object()
        .and_then(|obj| obj.get("type"))
        .and_then(Value::as_str)
        .is_some_and(|ty| GEOJSON_TYPES.contains(&ty))
}

impl std::str::FromStr for GeoJson {
    type Err = GeoJsonError;

    fn from_str(payload: &str) -> Result<Self, Self::Err> {
        let value: Value = serde_json::from_str(payload)?;
        Self::from_value(&value)
    }
}

impl GeoJson {
    pub fn from_value(value: &Value) -> Result<Self, GeoJsonError> {
        if !is_valid_geojson(value) {
            return Err(GeoJsonError::NotGeoJson);
        }
        let obj = value.as_object().ok_or(GeoJsonError::NotGeoJson)?;
        let ty = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or(GeoJsonError::NotGeoJson)?;

        match ty {
            "FeatureCollection" => {
                let features_val = obj.get("features").and_then(Value::as_array).ok_or(
                    GeoJsonError::Invalid {
                        kind: "FeatureCollection",
                        reason: "missing \"features\" array".to_string(),
                    },
                )?;
                let features = features_val
                    .iter()
                    .enumerate()
                    .filter_map(|(index, f)| parse_feature(f, index))
                    .collect();
                Ok(GeoJson::FeatureCollection(FeatureCollection { features }))
            }
            "Feature" => parse_feature(value, 0).map(GeoJson::Feature).ok_or(
                GeoJsonError::Invalid {
                    kind: "Feature",
                    reason: "feature must be an object".to_string(),
                },
            ),
            _ => parse_geometry(value)
                .map(GeoJson::Geometry)
                .map_err(|reason| GeoJsonError::Invalid {
                    kind: "geometry",
                    reason,
                }),
        }
    }

    pub fn as_feature_collection(&self) -> Option<&FeatureCollection> {
        match self {
            GeoJson::FeatureCollection(fc) => Some(fc),
            _ => None,
        }
    }

    /// Geometries in document order, skipping features without one.
    pub fn geometries(&self) -> Vec<&Geometry> {
        match self {
            GeoJson::FeatureCollection(fc) => fc
                .features
                .iter()
                .filter_map(|f| f.geometry.as_ref())
                .collect(),
            GeoJson::Feature(f) => f.geometry.iter().collect(),
            GeoJson::Geometry(g) => vec![g],
        }
    }

    /// Re-emits the document; used for caching the upload in the object store.
    pub fn to_value(&self) -> Value {
        match self {
            GeoJson::FeatureCollection(fc) => {
                let mut root = Map::new();
                root.insert(
                    "type".to_string(),
                    Value::String("FeatureCollection".to_string()),
                );
                root.insert(
                    "features".to_string(),
                    Value::Array(fc.features.iter().map(feature_to_value).collect()),
                );
                Value::Object(root)
            }
            GeoJson::Feature(f) => feature_to_value(f),
            GeoJson::Geometry(g) => geometry_to_value(g),
        }
    }
}

fn parse_feature(value: &Value, index: usize) -> Option<Feature> {
    let Some(obj) = value.as_object() else {
        tracing::debug!(index, "skipping non-object feature");
        return None;
    };

    let id = match obj.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    let properties = obj
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let geometry = match obj.get("geometry") {
        None | Some(Value::Null) => None,
        Some(g) => match parse_geometry(g) {
            Ok(g) => Some(g),
            Err(reason) => {
                tracing::debug!(index, %reason, "ignoring malformed feature geometry");
                None
            }
        },
    };

    Some(Feature {
        id,
        properties,
        geometry,
    })
}

fn parse_geometry(value: &Value) -> Result<Geometry, String> {
    let obj = value
        .as_object()
        .ok_or("geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("geometry missing type".to_string())?;

    if ty == "GeometryCollection" {
        let members = obj
            .get("geometries")
            .and_then(Value::as_array)
            .ok_or("GeometryCollection missing geometries".to_string())?;
        let mut out = Vec::with_capacity(members.len());
        for member in members {
            out.push(parse_geometry(member)?);
        }
        return Ok(Geometry::GeometryCollection(out));
    }

    let coords = obj
        .get("coordinates")
        .ok_or("geometry missing coordinates".to_string())?;

    match ty {
        "Point" => Ok(Geometry::Point(parse_position(coords)?)),
        "MultiPoint" => Ok(Geometry::MultiPoint(parse_positions(coords)?)),
        "LineString" => Ok(Geometry::LineString(parse_positions(coords)?)),
        "MultiLineString" => Ok(Geometry::MultiLineString(parse_rings(coords)?)),
        "Polygon" => Ok(Geometry::Polygon(parse_rings(coords)?)),
        "MultiPolygon" => {
            let polys = coords
                .as_array()
                .ok_or("MultiPolygon coordinates must be an array of polygons".to_string())?;
            let mut out = Vec::with_capacity(polys.len());
            for poly in polys {
                out.push(parse_rings(poly)?);
            }
            Ok(Geometry::MultiPolygon(out))
        }
        other => Err(format!("unsupported geometry type: {other}")),
    }
}

fn parse_position(coords: &Value) -> Result<LatLng, String> {
    let arr = coords
        .as_array()
        .ok_or("position must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("position must have [lng, lat]".to_string());
    }
    let lng = arr[0].as_f64().ok_or("lng must be a number".to_string())?;
    let lat = arr[1].as_f64().ok_or("lat must be a number".to_string())?;
    Ok(LatLng::from_lng_lat([lng, lat]))
}

fn parse_positions(coords: &Value) -> Result<Vec<LatLng>, String> {
    let arr = coords
        .as_array()
        .ok_or("coordinates must be an array".to_string())?;
    arr.iter().map(parse_position).collect()
}

fn parse_rings(coords: &Value) -> Result<Vec<Vec<LatLng>>, String> {
    let arr = coords
        .as_array()
        .ok_or("coordinates must be an array of rings".to_string())?;
    arr.iter().map(parse_positions).collect()
}

fn feature_to_value(feat: &Feature) -> Value {
    let mut obj = Map::new();
    obj.insert("type".to_string(), Value::String("Feature".to_string()));
    if let Some(id) = &feat.id {
        obj.insert("id".to_string(), Value::String(id.clone()));
    }
    obj.insert(
        "properties".to_string(),
        Value::Object(feat.properties.clone()),
    );
    obj.insert(
        "geometry".to_string(),
        feat.geometry.as_ref().map_or(Value::Null, geometry_to_value),
    );
    Value::Object(obj)
}

fn geometry_to_value(geom: &Geometry) -> Value {
    let (ty, key, payload) = match geom {
        Geometry::Point(p) => ("Point", "coordinates", position_value(p)),
        Geometry::MultiPoint(ps) => ("MultiPoint", "coordinates", positions_value(ps)),
        Geometry::LineString(ps) => ("LineString", "coordinates", positions_value(ps)),
        Geometry::MultiLineString(lines) => {
            ("MultiLineString", "coordinates", rings_value(lines))
        }
        Geometry::Polygon(rings) => ("Polygon", "coordinates", rings_value(rings)),
        Geometry::MultiPolygon(polys) => (
            "MultiPolygon",
            "coordinates",
            Value::Array(polys.iter().map(|p| rings_value(p)).collect()),
        ),
        Geometry::GeometryCollection(members) => (
            "GeometryCollection",
            "geometries",
            Value::Array(members.iter().map(geometry_to_value).collect()),
        ),
    };
    let mut obj = Map::new();
    obj.insert("type".to_string(), Value::String(ty.to_string()));
    obj.insert(key.to_string(), payload);
    Value::Object(obj)
}

fn position_value(p: &LatLng) -> Value {
    Value::Array(vec![Value::from(p.lng), Value::from(p.lat)])
}

fn positions_value(ps: &[LatLng]) -> Value {
    Value::Array(ps.iter().map(position_value).collect())
}

fn rings_value(rings: &[Vec<LatLng>]) -> Value {
    Value::Array(rings.iter().map(|r| positions_value(r)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn media_type_must_be_geojson() {
        assert!(check_media_type("application/geo+json").is_ok());
        assert!(check_media_type("Application/JSON; charset=utf-8").is_ok());
        for rejected in ["", "text/plain", "application/vnd.google-earth.kml+xml"] {
            let err = check_media_type(rejected).unwrap_err();
            assert_eq!(err.to_string(), "You can only upload GeoJSON files");
        }
    }

    #[test]
    fn structural_check_accepts_known_types_only() {
        assert!(is_valid_geojson(&json!({"type": "FeatureCollection"})));
        assert!(is_valid_geojson(&json!({"type": "GeometryCollection"})));
        assert!(!is_valid_geojson(&json!({"type": "Topology"})));
        assert!(!is_valid_geojson(&json!({"features": []})));
        assert!(!is_valid_geojson(&json!([1, 2])));
        assert!(!is_valid_geojson(&json!("Point")));
    }

    #[test]
    fn parses_points_in_lng_lat_order() {
        let doc: GeoJson = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"name":"a"},"geometry":{"type":"Point","coordinates":[10,20]}}
        ]}"#
        .parse()
        .expect("parse");
        let fc = doc.as_feature_collection().unwrap();
        assert_eq!(
            fc.features[0].geometry,
            Some(Geometry::Point(LatLng::new(20.0, 10.0)))
        );
    }

    #[test]
    fn malformed_feature_geometry_is_dropped_not_fatal() {
        let doc = GeoJson::from_value(&json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": ["x"]}},
                {"type": "Feature", "properties": {}, "geometry": null}
            ]
        }))
        .expect("parse");
        let fc = doc.as_feature_collection().unwrap();
        assert_eq!(fc.features.len(), 2);
        assert!(fc.features.iter().all(|f| f.geometry.is_none()));
        assert!(doc.geometries().is_empty());
    }

    #[test]
    fn rejects_non_json_and_unknown_types() {
        assert!(matches!(
            "not json".parse::<GeoJson>(),
            Err(GeoJsonError::Json(_))
        ));
        assert!(matches!(
            GeoJson::from_value(&json!({"type": "Topology"})),
            Err(GeoJsonError::NotGeoJson)
        ));
        assert!(matches!(
            GeoJson::from_value(&json!({"type": "FeatureCollection"})),
            Err(GeoJsonError::Invalid { .. })
        ));
    }

    #[test]
    fn property_order_survives_round_trip() {
        let doc = GeoJson::from_value(&json!({
            "type": "Feature",
            "properties": {"zeta": 1, "alpha": 2, "mid": "x"},
            "geometry": {"type": "GeometryCollection", "geometries": [
                {"type": "Point", "coordinates": [1, 2]},
                {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}
            ]}
        }))
        .expect("parse");
        let value = doc.to_value();
        let keys: Vec<&str> = value["properties"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(GeoJson::from_value(&value).unwrap(), doc);
    }
}
