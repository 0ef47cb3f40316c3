use crate::scene::{CountyShape, Surface};
use crate::types::{CountyGeometry, CountyId};
use geojson::{feature::Id, Feature, FeatureCollection, Geometry, JsonObject, JsonValue};

fn feature_id(id: &CountyId) -> Id {
    match id {
        CountyId::Numeric(n) => Id::Number((*n).into()),
        CountyId::Text(s) => Id::String(s.clone()),
    }
}

fn properties(shape: &CountyShape) -> JsonObject {
    let mut props = JsonObject::new();
    if let Some(fips) = &shape.fips {
        props.insert("fips".to_string(), serde_json::to_value(fips).unwrap_or(JsonValue::Null));
    }
    if let Some(record) = &shape.record {
        props.insert("area_name".to_string(), JsonValue::from(record.area_name.clone()));
        props.insert("state".to_string(), JsonValue::from(record.state.clone()));
    }
    props.insert("bachelorsOrHigher".to_string(), JsonValue::from(shape.education));
    props.insert("fill".to_string(), JsonValue::from(shape.fill.to_hex()));
    props
}

/// Joined counties in source coordinates. Shapes are matched to features by
/// position, which the join stage preserves.
pub fn feature_collection(geometry: &CountyGeometry, surface: &Surface) -> FeatureCollection {
    let features = geometry
        .counties
        .iter()
        .zip(&surface.shapes)
        .map(|(county, shape)| Feature {
            bbox: None,
            geometry: (!county.geometry.0.is_empty()).then(|| Geometry::new(geojson::Value::from(&county.geometry))),
            id: county.id.as_ref().map(feature_id),
            properties: Some(properties(shape)),
            foreign_members: None,
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
