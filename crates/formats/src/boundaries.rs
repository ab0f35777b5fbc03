use std::path::Path;

use geo::{Centroid, Coord, LineString, MultiPolygon, Polygon};
use serde_json::{Map, Value};
use tracing::info;

use crate::source::{SourceError, read_source};
use crate::trade_table::PROVINCE_COLUMN;

/// One province boundary from the GeoJSON source.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    pub id: Option<String>,
    /// Raw `Provinsi` property; empty when missing or not a string.
    pub province: String,
    pub properties: Map<String, Value>,
    pub geometry: MultiPolygon<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundaryTable {
    pub features: Vec<BoundaryFeature>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryParseError {
    Json(String),
    NotAFeatureCollection,
    InvalidFeature { index: usize, reason: String },
}

impl BoundaryParseError {
    fn into_source_error(self, path: &Path) -> SourceError {
        match self {
            BoundaryParseError::Json(reason) => SourceError::parse(path, reason),
            BoundaryParseError::NotAFeatureCollection => {
                SourceError::parse(path, "expected GeoJSON FeatureCollection")
            }
            BoundaryParseError::InvalidFeature { index, reason } => SourceError::GeometryFormat {
                path: path.to_path_buf(),
                index,
                reason,
            },
        }
    }
}

impl BoundaryTable {
    pub fn from_geojson_str(payload: &str) -> Result<Self, BoundaryParseError> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|e| BoundaryParseError::Json(format!("JSON parse error: {e}")))?;
        Self::from_geojson_value(value)
    }

    pub fn from_geojson_value(value: Value) -> Result<Self, BoundaryParseError> {
        let obj = value
            .as_object()
            .ok_or(BoundaryParseError::NotAFeatureCollection)?;
        let ty = obj
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or(BoundaryParseError::NotAFeatureCollection)?;
        if ty != "FeatureCollection" {
            return Err(BoundaryParseError::NotAFeatureCollection);
        }

        let features_val = obj
            .get("features")
            .and_then(|v| v.as_array())
            .ok_or(BoundaryParseError::NotAFeatureCollection)?;

        let mut features = Vec::with_capacity(features_val.len());
        for (index, feat_val) in features_val.iter().enumerate() {
            let invalid = |reason: String| BoundaryParseError::InvalidFeature { index, reason };

            let feat_obj = feat_val
                .as_object()
                .ok_or_else(|| invalid("feature must be an object".to_string()))?;
            match feat_obj.get("type").and_then(|v| v.as_str()) {
                Some("Feature") => {}
                Some(other) => return Err(invalid(format!("unexpected feature type: {other}"))),
                None => return Err(invalid("feature missing type".to_string())),
            }

            let id = match feat_obj.get("id") {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            };

            let properties = feat_obj
                .get("properties")
                .and_then(|v| v.as_object())
                .cloned()
                .unwrap_or_default();
            let province = properties
                .get(PROVINCE_COLUMN)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();

            let geometry_val = feat_obj
                .get("geometry")
                .filter(|v| !v.is_null())
                .ok_or_else(|| invalid("feature missing geometry".to_string()))?;
            let geometry = parse_area_geometry(geometry_val).map_err(invalid)?;
            if geometry.centroid().is_none() {
                return Err(invalid("geometry has no coordinates".to_string()));
            }

            features.push(BoundaryFeature {
                id,
                province,
                properties,
                geometry,
            });
        }

        Ok(Self { features })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

pub fn load_boundaries(path: impl AsRef<Path>) -> Result<BoundaryTable, SourceError> {
    let path = path.as_ref();
    let bytes = read_source(path)?;
    parse_boundaries(path, &bytes)
}

pub fn parse_boundaries(path: &Path, bytes: &[u8]) -> Result<BoundaryTable, SourceError> {
    let payload = std::str::from_utf8(bytes)
        .map_err(|e| SourceError::parse(path, format!("not UTF-8: {e}")))?;
    let table =
        BoundaryTable::from_geojson_str(payload).map_err(|e| e.into_source_error(path))?;
    info!(path = %path.display(), features = table.len(), "loaded boundaries");
    Ok(table)
}

/// Polygons are promoted to single-member multipolygons.
fn parse_area_geometry(value: &Value) -> Result<MultiPolygon<f64>, String> {
    let obj = value
        .as_object()
        .ok_or("geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("geometry missing type".to_string())?;
    let coords = obj
        .get("coordinates")
        .ok_or("geometry missing coordinates".to_string())?;

    match ty {
        "Polygon" => Ok(MultiPolygon::new(vec![parse_polygon(coords)?])),
        "MultiPolygon" => {
            let polys = coords
                .as_array()
                .ok_or("MultiPolygon coordinates must be an array of polygons".to_string())?;
            let mut out = Vec::with_capacity(polys.len());
            for poly in polys {
                out.push(parse_polygon(poly)?);
            }
            Ok(MultiPolygon::new(out))
        }
        other => Err(format!("unsupported geometry type: {other}")),
    }
}

fn parse_polygon(coords: &Value) -> Result<Polygon<f64>, String> {
    let rings = coords
        .as_array()
        .ok_or("Polygon coordinates must be an array of rings".to_string())?;
    let mut parsed = Vec::with_capacity(rings.len());
    for ring in rings {
        parsed.push(parse_ring(ring)?);
    }
    let mut parsed = parsed.into_iter();
    let exterior = parsed.next().unwrap_or_else(|| LineString::new(Vec::new()));
    Ok(Polygon::new(exterior, parsed.collect()))
}

fn parse_ring(coords: &Value) -> Result<LineString<f64>, String> {
    let arr = coords
        .as_array()
        .ok_or("ring must be an array of positions".to_string())?;
    let mut out = Vec::with_capacity(arr.len());
    for item in arr {
        out.push(parse_position(item)?);
    }
    Ok(LineString::new(out))
}

fn parse_position(coords: &Value) -> Result<Coord<f64>, String> {
    let arr = coords
        .as_array()
        .ok_or("position must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("position must have [lon, lat]".to_string());
    }
    let x = arr[0].as_f64().ok_or("lon must be a number".to_string())?;
    let y = arr[1].as_f64().ok_or("lat must be a number".to_string())?;
    Ok(Coord { x, y })
}

#[cfg(test)]
mod tests {
    use super::{BoundaryParseError, BoundaryTable, load_boundaries};
    use crate::source::SourceError;
    use geo::Centroid;
    use serde_json::json;
    use std::path::PathBuf;

    fn square(lon: f64, lat: f64, r: f64) -> serde_json::Value {
        json!([[
            [lon - r, lat - r],
            [lon + r, lat - r],
            [lon + r, lat + r],
            [lon - r, lat + r],
            [lon - r, lat - r]
        ]])
    }

    fn collection(features: Vec<serde_json::Value>) -> serde_json::Value {
        json!({ "type": "FeatureCollection", "features": features })
    }

    #[test]
    fn parses_demo_boundaries() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../apps/server/assets/indonesia.geojson");
        let table = load_boundaries(path).expect("load boundaries");
        assert_eq!(table.len(), 12);
        assert_eq!(table.features[0].province, "Aceh");
        assert_eq!(table.features[0].id.as_deref(), Some("1"));
        let riau = table
            .features
            .iter()
            .find(|f| f.province == "Riau")
            .expect("riau");
        assert_eq!(riau.geometry.0.len(), 2);
    }

    #[test]
    fn polygon_is_promoted_and_centroid_is_area_center() {
        let table = BoundaryTable::from_geojson_value(collection(vec![json!({
            "type": "Feature",
            "properties": { "Provinsi": "Bali" },
            "geometry": { "type": "Polygon", "coordinates": square(115.0, -8.0, 0.5) }
        })]))
        .expect("parse");
        let geom = &table.features[0].geometry;
        assert_eq!(geom.0.len(), 1);
        let c = geom.centroid().expect("centroid");
        assert!((c.x() - 115.0).abs() < 1e-9);
        assert!((c.y() + 8.0).abs() < 1e-9);
    }

    #[test]
    fn missing_province_property_is_empty() {
        let table = BoundaryTable::from_geojson_value(collection(vec![json!({
            "type": "Feature",
            "properties": { "Provinsi": 17 },
            "geometry": { "type": "Polygon", "coordinates": square(100.0, 0.0, 1.0) }
        })]))
        .expect("parse");
        assert_eq!(table.features[0].province, "");
    }

    #[test]
    fn point_geometry_is_rejected_with_index() {
        let err = BoundaryTable::from_geojson_value(collection(vec![
            json!({
                "type": "Feature",
                "properties": { "Provinsi": "Aceh" },
                "geometry": { "type": "Polygon", "coordinates": square(96.0, 4.0, 1.0) }
            }),
            json!({
                "type": "Feature",
                "properties": { "Provinsi": "Riau" },
                "geometry": { "type": "Point", "coordinates": [101.0, 0.5] }
            }),
        ]))
        .expect_err("point");
        match err {
            BoundaryParseError::InvalidFeature { index, reason } => {
                assert_eq!(index, 1);
                assert!(reason.contains("Point"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn null_and_empty_geometries_are_rejected() {
        for geometry in [
            json!(null),
            json!({ "type": "Polygon", "coordinates": [] }),
            json!({ "type": "Polygon", "coordinates": [[["a", 1.0]]] }),
        ] {
            let err = BoundaryTable::from_geojson_value(collection(vec![json!({
                "type": "Feature",
                "properties": { "Provinsi": "Aceh" },
                "geometry": geometry
            })]))
            .expect_err("invalid geometry");
            assert!(matches!(err, BoundaryParseError::InvalidFeature { index: 0, .. }));
        }
    }

    #[test]
    fn file_errors_map_to_source_errors() {
        let dir = tempfile::tempdir().expect("tempdir");

        let not_json = dir.path().join("bad.geojson");
        std::fs::write(&not_json, b"{ nope").expect("write");
        assert!(matches!(
            load_boundaries(&not_json),
            Err(SourceError::Parse { .. })
        ));

        let bad_geom = dir.path().join("bad_geom.geojson");
        let payload = collection(vec![json!({
            "type": "Feature",
            "properties": {},
            "geometry": { "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]] }
        })]);
        std::fs::write(&bad_geom, payload.to_string()).expect("write");
        assert!(matches!(
            load_boundaries(&bad_geom),
            Err(SourceError::GeometryFormat { index: 0, .. })
        ));

        assert!(matches!(
            load_boundaries(dir.path().join("missing.geojson")),
            Err(SourceError::FileAccess { .. })
        ));
    }
}
