//! Boundary decoding: TopoJSON topologies (and plain GeoJSON collections)
//! into county polygons plus an optional state border mesh.
//!
//! TopoJSON stores every shared boundary once as an "arc". Geometries refer
//! to arcs by index, with `~i` (a negative number) meaning arc `i` walked
//! backwards. Quantized topologies additionally delta-encode arc positions
//! and carry a `transform` that maps the integer grid back to coordinates.

use crate::error::RenderError;
use crate::types::{CountyFeature, CountyGeometry, CountyId};
use geo::{Coord, LineString, MultiLineString, MultiPolygon, Polygon};
use geojson::GeoJson;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct Topology {
    #[serde(rename = "type")]
    pub kind: String,
    pub transform: Option<Transform>,
    pub arcs: Vec<Vec<Vec<f64>>>,
    pub objects: HashMap<String, TopoGeometry>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopoGeometry {
    /// `null` is a legal geometry type in TopoJSON.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub id: Option<CountyId>,
    #[serde(default)]
    pub arcs: Option<ArcRefs>,
    #[serde(default)]
    pub geometries: Vec<TopoGeometry>,
}

/// Arc references at the nesting depth their geometry type implies.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ArcRefs {
    Line(Vec<i64>),
    Rings(Vec<Vec<i64>>),
    Polygons(Vec<Vec<Vec<i64>>>),
}

impl ArcRefs {
    fn flatten(&self) -> Vec<i64> {
        match self {
            ArcRefs::Line(refs) => refs.clone(),
            ArcRefs::Rings(rings) => rings.iter().flatten().copied().collect(),
            ArcRefs::Polygons(polys) => polys.iter().flatten().flatten().copied().collect(),
        }
    }
}

/// Splits an arc reference into its index and direction.
fn arc_index(reference: i64) -> (usize, bool) {
    if reference < 0 {
        ((!reference) as usize, true)
    } else {
        (reference as usize, false)
    }
}

impl Topology {
    pub fn from_value(value: serde_json::Value) -> Result<Self, RenderError> {
        serde_json::from_value(value).map_err(|e| RenderError::MalformedTopology(e.to_string()))
    }

    /// Arcs as absolute coordinates, transform applied.
    pub fn decode_arcs(&self) -> Vec<Vec<Coord<f64>>> {
        self.arcs
            .iter()
            .map(|arc| {
                let (mut x, mut y) = (0.0, 0.0);
                arc.iter()
                    .filter(|p| p.len() >= 2)
                    .map(|p| match &self.transform {
                        Some(t) => {
                            x += p[0];
                            y += p[1];
                            Coord {
                                x: x * t.scale[0] + t.translate[0],
                                y: y * t.scale[1] + t.translate[1],
                            }
                        }
                        None => Coord { x: p[0], y: p[1] },
                    })
                    .collect()
            })
            .collect()
    }

    fn object(&self, name: &str) -> Result<&TopoGeometry, RenderError> {
        self.objects
            .get(name)
            .ok_or_else(|| RenderError::MissingObject(name.to_string()))
    }

    /// Converts the named object into one feature per member geometry.
    pub fn features(&self, name: &str) -> Result<Vec<CountyFeature>, RenderError> {
        let object = self.object(name)?;
        let arcs = self.decode_arcs();

        let members: Vec<&TopoGeometry> = if object.kind.as_deref() == Some("GeometryCollection") {
            object.geometries.iter().collect()
        } else {
            vec![object]
        };

        members
            .into_iter()
            .map(|geometry| {
                Ok(CountyFeature {
                    id: geometry.id.clone(),
                    geometry: polygons(geometry, &arcs)?,
                })
            })
            .collect()
    }

    /// Arcs of the named object as lines. With `interior_only`, keeps just the
    /// arcs shared by two different geometries, i.e. borders between regions.
    pub fn mesh(&self, name: &str, interior_only: bool) -> Result<MultiLineString<f64>, RenderError> {
        let object = self.object(name)?;
        let arcs = self.decode_arcs();

        let mut leaves = Vec::new();
        collect_leaves(object, &mut leaves);

        // arc index -> (first geometry, last geometry) referencing it
        let mut owners: BTreeMap<usize, (usize, usize)> = BTreeMap::new();
        for (geometry_index, leaf) in leaves.iter().enumerate() {
            let Some(refs) = &leaf.arcs else { continue };
            for reference in refs.flatten() {
                let (index, _) = arc_index(reference);
                owners
                    .entry(index)
                    .and_modify(|(_, last)| *last = geometry_index)
                    .or_insert((geometry_index, geometry_index));
            }
        }

        let mut lines = Vec::new();
        for (index, (first, last)) in owners {
            if interior_only && first == last {
                continue;
            }
            let arc = arcs.get(index).ok_or_else(|| {
                RenderError::MalformedTopology(format!("arc index {} out of range", index))
            })?;
            lines.push(LineString::new(arc.clone()));
        }
        Ok(MultiLineString::new(lines))
    }
}

fn collect_leaves<'a>(geometry: &'a TopoGeometry, out: &mut Vec<&'a TopoGeometry>) {
    if geometry.kind.as_deref() == Some("GeometryCollection") {
        for child in &geometry.geometries {
            collect_leaves(child, out);
        }
    } else {
        out.push(geometry);
    }
}

fn ring(arcs: &[Vec<Coord<f64>>], refs: &[i64]) -> Result<Vec<Coord<f64>>, RenderError> {
    let mut points: Vec<Coord<f64>> = Vec::new();
    for &reference in refs {
        let (index, reversed) = arc_index(reference);
        let arc = arcs.get(index).ok_or_else(|| {
            RenderError::MalformedTopology(format!("arc reference {} out of range", reference))
        })?;
        // consecutive arcs share their junction point
        points.pop();
        if reversed {
            points.extend(arc.iter().rev().copied());
        } else {
            points.extend(arc.iter().copied());
        }
    }
    // a ring needs at least four positions
    while !points.is_empty() && points.len() < 4 {
        points.push(points[0]);
    }
    Ok(points)
}

fn polygon(arcs: &[Vec<Coord<f64>>], rings: &[Vec<i64>]) -> Result<Option<Polygon<f64>>, RenderError> {
    let mut built = rings
        .iter()
        .map(|refs| ring(arcs, refs).map(LineString::new))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|ls| !ls.0.is_empty());

    Ok(built.next().map(|exterior| Polygon::new(exterior, built.collect())))
}

fn polygons(geometry: &TopoGeometry, arcs: &[Vec<Coord<f64>>]) -> Result<MultiPolygon<f64>, RenderError> {
    let parts = match (geometry.kind.as_deref(), &geometry.arcs) {
        (Some("Polygon"), Some(ArcRefs::Rings(rings))) => polygon(arcs, rings)?.into_iter().collect(),
        (Some("MultiPolygon"), Some(ArcRefs::Polygons(polys))) => {
            let mut out = Vec::with_capacity(polys.len());
            for rings in polys {
                out.extend(polygon(arcs, rings)?);
            }
            out
        }
        // an empty arcs array deserializes as the shallowest variant
        (Some("Polygon" | "MultiPolygon"), Some(ArcRefs::Line(refs))) if refs.is_empty() => Vec::new(),
        (Some("Polygon" | "MultiPolygon"), Some(_)) => {
            return Err(RenderError::MalformedTopology(format!(
                "arc nesting does not match geometry type for id {:?}",
                geometry.id
            )))
        }
        (kind, _) => {
            debug!("Skipping non-polygonal geometry {:?} (id {:?})", kind, geometry.id);
            Vec::new()
        }
    };
    Ok(MultiPolygon::new(parts))
}

/// Decodes a boundary document, dispatching on its `type` member.
pub fn decode_boundaries(
    value: serde_json::Value,
    counties_object: &str,
    states_object: &str,
) -> Result<CountyGeometry, RenderError> {
    let kind = value
        .get("type")
        .and_then(|t| t.as_str())
        .unwrap_or("<missing>")
        .to_string();

    match kind.as_str() {
        "Topology" => {
            let topology = Topology::from_value(value)?;
            let counties = topology.features(counties_object)?;
            let state_borders = match topology.mesh(states_object, true) {
                Ok(mesh) => Some(mesh),
                Err(RenderError::MissingObject(name)) => {
                    warn!("Topology has no '{}' object; drawing without state borders", name);
                    None
                }
                Err(e) => return Err(e),
            };
            Ok(CountyGeometry { counties, state_borders })
        }
        "FeatureCollection" => Ok(CountyGeometry {
            counties: features_from_geojson(value)?,
            state_borders: None,
        }),
        other => Err(RenderError::UnsupportedSource(other.to_string())),
    }
}

fn features_from_geojson(value: serde_json::Value) -> Result<Vec<CountyFeature>, RenderError> {
    let geojson = GeoJson::from_json_value(value)
        .map_err(|e| RenderError::MalformedTopology(e.to_string()))?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(RenderError::UnsupportedSource("GeoJSON must be a FeatureCollection".into())),
    };

    let mut features = Vec::with_capacity(collection.features.len());
    for feature in collection.features {
        let id = match &feature.id {
            Some(geojson::feature::Id::String(s)) => Some(CountyId::Text(s.clone())),
            Some(geojson::feature::Id::Number(n)) => n.as_u64().map(CountyId::Numeric),
            None => feature
                .properties
                .as_ref()
                .and_then(|props| props.get("id").or_else(|| props.get("fips")))
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
        };

        let geometry = match feature.geometry {
            Some(geom) => {
                let converted: geo::Geometry<f64> = geom
                    .value
                    .try_into()
                    .map_err(|e| RenderError::MalformedTopology(format!("{:?}", e)))?;
                match converted {
                    geo::Geometry::MultiPolygon(mp) => mp,
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    _ => continue,
                }
            }
            None => MultiPolygon::new(Vec::new()),
        };

        features.push(CountyFeature { id, geometry });
    }
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Two unit squares side by side sharing the arc x = 1.
    fn two_squares() -> serde_json::Value {
        json!({
            "type": "Topology",
            "arcs": [
                [[1.0, 0.0], [1.0, 1.0]],
                [[1.0, 1.0], [0.0, 1.0], [0.0, 0.0], [1.0, 0.0]],
                [[1.0, 0.0], [2.0, 0.0], [2.0, 1.0], [1.0, 1.0]]
            ],
            "objects": {
                "counties": {
                    "type": "GeometryCollection",
                    "geometries": [
                        {"type": "Polygon", "id": 1001, "arcs": [[0, 1]]},
                        {"type": "Polygon", "id": "01003", "arcs": [[2, -1]]}
                    ]
                },
                "states": {
                    "type": "GeometryCollection",
                    "geometries": [
                        {"type": "Polygon", "id": 1, "arcs": [[0, 1]]},
                        {"type": "Polygon", "id": 2, "arcs": [[2, -1]]}
                    ]
                }
            }
        })
    }

    #[test]
    fn stitches_rings_from_shared_arcs() {
        let topology = Topology::from_value(two_squares()).unwrap();
        let features = topology.features("counties").unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].id, Some(CountyId::Numeric(1001)));
        assert_eq!(features[1].id, Some(CountyId::Text("01003".into())));

        let left = &features[0].geometry.0[0];
        let xs: Vec<(f64, f64)> = left.exterior().coords().map(|c| (c.x, c.y)).collect();
        assert_eq!(xs, vec![(1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0), (1.0, 0.0)]);

        // second polygon walks the shared arc backwards
        let right = &features[1].geometry.0[0];
        let last_two: Vec<(f64, f64)> =
            right.exterior().coords().rev().take(2).map(|c| (c.x, c.y)).collect();
        assert_eq!(last_two, vec![(1.0, 0.0), (1.0, 1.0)]);
    }

    #[test]
    fn quantized_arcs_are_delta_decoded() {
        let topology = Topology::from_value(json!({
            "type": "Topology",
            "transform": {"scale": [0.5, 2.0], "translate": [10.0, 20.0]},
            "arcs": [[[0, 0], [2, 0], [0, 3]]],
            "objects": {}
        }))
        .unwrap();
        let arcs = topology.decode_arcs();
        let points: Vec<(f64, f64)> = arcs[0].iter().map(|c| (c.x, c.y)).collect();
        assert_eq!(points, vec![(10.0, 20.0), (11.0, 20.0), (11.0, 26.0)]);
    }

    #[test]
    fn interior_mesh_keeps_only_shared_borders() {
        let topology = Topology::from_value(two_squares()).unwrap();
        let interior = topology.mesh("states", true).unwrap();
        assert_eq!(interior.0.len(), 1);
        assert_eq!(interior.0[0].0, vec![Coord { x: 1.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 }]);

        let all = topology.mesh("states", false).unwrap();
        assert_eq!(all.0.len(), 3);
    }

    #[test]
    fn missing_counties_object_is_reported() {
        let err = decode_boundaries(two_squares(), "districts", "states").unwrap_err();
        assert!(matches!(err, RenderError::MissingObject(name) if name == "districts"));
    }

    #[test]
    fn missing_states_object_only_drops_the_mesh() {
        let geometry = decode_boundaries(two_squares(), "counties", "nations").unwrap();
        assert_eq!(geometry.counties.len(), 2);
        assert!(geometry.state_borders.is_none());
    }

    #[test]
    fn out_of_range_arc_is_malformed() {
        let value = json!({
            "type": "Topology",
            "arcs": [],
            "objects": {"counties": {"type": "Polygon", "id": 5, "arcs": [[3]]}}
        });
        let err = decode_boundaries(value, "counties", "states").unwrap_err();
        assert!(matches!(err, RenderError::MalformedTopology(_)));
    }

    #[test]
    fn null_geometry_yields_empty_feature() {
        let value = json!({
            "type": "Topology",
            "arcs": [],
            "objects": {"counties": {"type": "GeometryCollection", "geometries": [
                {"type": null, "id": 2013}
            ]}}
        });
        let geometry = decode_boundaries(value, "counties", "states").unwrap();
        assert_eq!(geometry.counties.len(), 1);
        assert!(geometry.counties[0].geometry.0.is_empty());
    }

    #[test]
    fn geojson_collections_are_accepted() {
        let value = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "id": 1001,
                "properties": {},
                "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}
            }, {
                "type": "Feature",
                "properties": {"fips": "01003"},
                "geometry": null
            }]
        });
        let geometry = decode_boundaries(value, "counties", "states").unwrap();
        assert_eq!(geometry.counties[0].id, Some(CountyId::Numeric(1001)));
        assert_eq!(geometry.counties[1].id, Some(CountyId::Text("01003".into())));
        assert!(geometry.state_borders.is_none());
    }

    #[test]
    fn other_documents_are_unsupported() {
        let err = decode_boundaries(json!([1, 2, 3]), "counties", "states").unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedSource(_)));
    }
}
