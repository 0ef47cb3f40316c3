use crate::data::EducationIndex;
use crate::projection::Projection;
use crate::scale::ColorScale;
use crate::scene::CountyShape;
use crate::types::{CountyFeature, Rgb};
use rayon::prelude::*;
use tracing::{debug, info};

/// Joins every feature to its education record, projects it onto the surface
/// and picks its fill. Unmatched features get `fallback` and education `0.0`.
pub fn build_shapes(
    features: &[CountyFeature],
    index: &EducationIndex,
    scale: &ColorScale,
    projection: &Projection,
    fallback: Rgb,
) -> Vec<CountyShape> {
    info!("Joining {} features against {} records...", features.len(), index.len());

    let shapes: Vec<CountyShape> = features
        .par_iter()
        .map(|feature| {
            let record = feature.id.as_ref().and_then(|id| index.get(id)).cloned();
            let (fill, education) = match &record {
                Some(r) => (scale.color(r.bachelors_or_higher), r.bachelors_or_higher),
                None => (fallback, 0.0),
            };
            CountyShape {
                fips: feature.id.clone(),
                outline: projection.multi_polygon(&feature.geometry),
                fill,
                education,
                record,
            }
        })
        .collect();

    let unmatched = shapes.iter().filter(|s| s.record.is_none()).count();
    if unmatched > 0 {
        debug!("{} counties have no education record and use the fallback colour", unmatched);
    }
    info!("Built {} county shapes ({} matched).", shapes.len(), shapes.len() - unmatched);

    shapes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KeyMode, ScaleKind};
    use crate::types::{CountyId, EducationRecord};
    use geo::{polygon, MultiPolygon};

    fn feature(id: Option<CountyId>) -> CountyFeature {
        CountyFeature {
            id,
            geometry: MultiPolygon::new(vec![polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)]]),
        }
    }

    fn records() -> Vec<EducationRecord> {
        [(1001, "Autauga", 21.4), (1003, "Baldwin", 28.6), (1005, "Barbour", 13.5)]
            .into_iter()
            .map(|(fips, name, pct)| EducationRecord {
                fips: CountyId::Numeric(fips),
                area_name: name.to_string(),
                state: "AL".to_string(),
                bachelors_or_higher: pct,
            })
            .collect()
    }

    #[test]
    fn matched_features_carry_their_percentage() {
        let records = records();
        let index = EducationIndex::build(&records, KeyMode::Normalize);
        let scale = ColorScale::new(ScaleKind::Quantile, records.iter().map(|r| r.bachelors_or_higher), 9);
        let fallback = Rgb(0xcc, 0xcc, 0xcc);

        let features = vec![
            feature(Some(CountyId::Numeric(1001))),
            feature(Some(CountyId::Numeric(1003))),
            feature(Some(CountyId::Numeric(9999))),
            feature(None),
        ];
        let shapes = build_shapes(&features, &index, &scale, &Projection::Identity, fallback);

        assert_eq!(shapes.len(), 4);
        assert_eq!(shapes[0].education, 21.4);
        assert_eq!(shapes[0].fill, scale.color(21.4));
        assert_eq!(shapes[1].education, 28.6);
        for unmatched in &shapes[2..] {
            assert_eq!(unmatched.fill, fallback);
            assert_eq!(unmatched.education, 0.0);
            assert!(unmatched.record.is_none());
        }
    }

    #[test]
    fn strict_mode_falls_back_on_type_mismatch() {
        let records = records();
        let index = EducationIndex::build(&records, KeyMode::Strict);
        let scale = ColorScale::Sequential;
        let fallback = Rgb(0xcc, 0xcc, 0xcc);

        let shapes = build_shapes(
            &[feature(Some(CountyId::Text("1001".into())))],
            &index,
            &scale,
            &Projection::Identity,
            fallback,
        );
        assert_eq!(shapes[0].fill, fallback);
        assert_eq!(shapes[0].education, 0.0);
    }
}
