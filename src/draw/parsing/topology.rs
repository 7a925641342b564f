//! TopoJSON boundary document parsing
//!
//! A boundary file is a topology: polygons reference shared arcs by index
//! (`~i` = arc `i` reversed), optionally quantized and delta-encoded. Arcs are
//! kept after decoding so group outlines can be dissolved topologically.

use crate::draw::geometry::{Point, Polygon, Ring, Shape};
use anyhow::Context;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Arc references of one polygon: rings, each a list of signed arc indices
pub type ArcPolygon = Vec<Vec<i64>>;

#[derive(Deserialize)]
struct RawTopology {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    transform: Option<RawTransform>,
    #[serde(default)]
    arcs: Vec<Vec<Vec<f64>>>,
    #[serde(default)]
    objects: IndexMap<String, RawGeometry>,
}

#[derive(Deserialize, Clone, Copy)]
struct RawTransform {
    scale: [f64; 2],
    translate: [f64; 2],
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum RawGeometry {
    GeometryCollection {
        #[serde(default)]
        geometries: Vec<RawGeometry>,
    },
    Polygon {
        arcs: Vec<Vec<i64>>,
        #[serde(default)]
        properties: Option<Map<String, Value>>,
        #[serde(default)]
        id: Option<Value>,
    },
    MultiPolygon {
        arcs: Vec<Vec<Vec<i64>>>,
        #[serde(default)]
        properties: Option<Map<String, Value>>,
        #[serde(default)]
        id: Option<Value>,
    },
    // Points and lines carry no area
    #[serde(other)]
    Other,
}

/// A polygonal geometry of the topology with its fine code
#[derive(Debug, Clone, PartialEq)]
pub struct TopoFeature {
    pub code: String,
    pub polygons: Vec<ArcPolygon>,
}

/// Decoded topology: absolute arc coordinates plus coded features
#[derive(Debug, Clone, Default)]
pub struct Topology {
    pub arcs: Vec<Vec<Point>>,
    pub features: Vec<TopoFeature>,
}

impl Topology {
    /// Parse a TopoJSON document. `code_keys` are the property names tried,
    /// in order, for each geometry's code; the geometry `id` is the fallback.
    pub fn parse(body: &str, code_keys: &[String]) -> anyhow::Result<Topology> {
        let raw: RawTopology = serde_json::from_str(body).context("invalid topology document")?;
        anyhow::ensure!(raw.kind == "Topology", "expected a Topology document, found '{}'", raw.kind);

        let arcs = raw.arcs.iter().map(|arc| decode_arc(arc, raw.transform)).collect();

        let mut features = Vec::new();
        let mut skipped = 0usize;
        for object in raw.objects.into_values() {
            collect_features(object, code_keys, &mut features, &mut skipped);
        }
        if skipped > 0 {
            tracing::debug!("[Topology] skipped {} polygon(s) without a code", skipped);
        }

        Ok(Topology { arcs, features })
    }

    /// Number of arcs; arc references outside `0..arc_count` are ignored
    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    /// Points of one signed arc reference in traversal order
    pub fn arc_points(&self, arc_ref: i64) -> Option<Vec<Point>> {
        let (index, reversed) = decode_arc_ref(arc_ref);
        let arc = self.arcs.get(index)?;
        Some(if reversed { arc.iter().rev().copied().collect() } else { arc.clone() })
    }

    /// Concatenate the arcs of one ring; shared endpoints appear once
    pub fn ring_points(&self, ring: &[i64]) -> Ring {
        let mut points: Ring = Vec::new();
        for &arc_ref in ring {
            let Some(arc) = self.arc_points(arc_ref) else { continue };
            let skip = usize::from(!points.is_empty());
            points.extend(arc.into_iter().skip(skip));
        }
        points
    }

    /// Materialize a feature's rings into coordinates
    pub fn shape(&self, feature: &TopoFeature) -> Option<Shape> {
        let polygons = feature
            .polygons
            .iter()
            .filter_map(|rings| {
                let mut rings = rings.iter().map(|r| self.ring_points(r));
                let exterior = rings.next()?;
                Some(Polygon::new(exterior, rings.collect()))
            })
            .collect();
        Shape::from_polygons(polygons)
    }
}

/// `(arc index, reversed)` for a signed arc reference
pub fn decode_arc_ref(arc_ref: i64) -> (usize, bool) {
    if arc_ref < 0 {
        ((!arc_ref) as usize, true)
    } else {
        (arc_ref as usize, false)
    }
}

fn decode_arc(arc: &[Vec<f64>], transform: Option<RawTransform>) -> Vec<Point> {
    let positions = arc.iter().filter(|pos| pos.len() >= 2);
    match transform {
        // Quantized arcs are delta-encoded
        Some(t) => {
            let (mut x, mut y) = (0.0, 0.0);
            positions
                .map(|pos| {
                    x += pos[0];
                    y += pos[1];
                    Point::new(x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1])
                })
                .collect()
        }
        None => positions.map(|pos| Point::new(pos[0], pos[1])).collect(),
    }
}

fn collect_features(geometry: RawGeometry, code_keys: &[String], out: &mut Vec<TopoFeature>, skipped: &mut usize) {
    let (polygons, properties, id) = match geometry {
        RawGeometry::GeometryCollection { geometries } => {
            for child in geometries {
                collect_features(child, code_keys, out, skipped);
            }
            return;
        }
        RawGeometry::Polygon { arcs, properties, id } => (vec![arcs], properties, id),
        RawGeometry::MultiPolygon { arcs, properties, id } => (arcs, properties, id),
        RawGeometry::Other => return,
    };

    match feature_code(properties.as_ref(), id.as_ref(), code_keys) {
        Some(code) => out.push(TopoFeature { code, polygons }),
        None => *skipped += 1,
    }
}

fn feature_code(properties: Option<&Map<String, Value>>, id: Option<&Value>, code_keys: &[String]) -> Option<String> {
    let from_properties = properties.and_then(|props| code_keys.iter().find_map(|key| props.get(key)));
    from_properties.or(id).and_then(value_as_code)
}

fn value_as_code(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys() -> Vec<String> {
        vec!["ZCTA5CE10".to_string(), "code".to_string()]
    }

    #[test]
    fn test_parse_quantized_topology() {
        // Two unit squares sharing the arc x=1
        let doc = json!({
            "type": "Topology",
            "transform": { "scale": [0.5, 0.5], "translate": [10.0, 20.0] },
            "arcs": [
                [[2, 0], [0, 2]],
                [[2, 2], [-2, 0], [0, -2], [2, 0]],
                [[2, 0], [2, 0], [0, 2], [-2, 0]]
            ],
            "objects": {
                "zips": {
                    "type": "GeometryCollection",
                    "geometries": [
                        { "type": "Polygon", "arcs": [[0, 1]], "properties": { "ZCTA5CE10": "90001" } },
                        { "type": "Polygon", "arcs": [[2, -1]], "properties": { "code": "90002" } },
                        { "type": "Polygon", "arcs": [[2]], "properties": {} },
                        { "type": "Point", "coordinates": [0, 0] }
                    ]
                }
            }
        });
        let topo = Topology::parse(&doc.to_string(), &keys()).unwrap();
        assert_eq!(topo.arc_count(), 3);
        assert_eq!(topo.arcs[0], vec![Point::new(11.0, 20.0), Point::new(11.0, 21.0)]);
        let codes: Vec<&str> = topo.features.iter().map(|f| f.code.as_str()).collect();
        assert_eq!(codes, vec!["90001", "90002"]);

        let Some(Shape::Polygon(west)) = topo.shape(&topo.features[0]) else {
            panic!("expected a single polygon");
        };
        assert_eq!(west.exterior.first(), west.exterior.last());
        assert_eq!(west.exterior.len(), 5);
        assert_eq!(west.area(), 0.25);
    }

    #[test]
    fn test_reversed_arc_reference() {
        assert_eq!(decode_arc_ref(0), (0, false));
        assert_eq!(decode_arc_ref(-1), (0, true));
        assert_eq!(decode_arc_ref(-3), (2, true));

        let topo = Topology {
            arcs: vec![vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(2.0, 0.0)]],
            features: vec![],
        };
        assert_eq!(topo.arc_points(-1).unwrap()[0], Point::new(2.0, 0.0));
        assert!(topo.arc_points(5).is_none());
    }

    #[test]
    fn test_numeric_id_fallback() {
        let doc = json!({
            "type": "Topology",
            "arcs": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
            "objects": { "a": { "type": "MultiPolygon", "arcs": [[[0]]], "id": 6 } }
        });
        let topo = Topology::parse(&doc.to_string(), &keys()).unwrap();
        assert_eq!(topo.features[0].code, "6");
        assert_eq!(topo.features[0].polygons.len(), 1);
    }

    #[test]
    fn test_rejects_non_topology() {
        let err = Topology::parse(r#"{"type":"FeatureCollection"}"#, &keys()).unwrap_err();
        assert!(err.to_string().contains("Topology"));
        assert!(Topology::parse("not json", &keys()).is_err());
    }
}
