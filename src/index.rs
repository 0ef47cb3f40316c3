use crate::scene::CountyShape;
use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::contains::Contains;
use geo::Point;
use rstar::{RTree, RTreeObject, AABB};

// Wrapper for RTree indexing
struct ShapeEnvelope {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for ShapeEnvelope {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

/// Point → county lookup over the projected shapes of one render pass.
pub struct CountyIndex {
    tree: RTree<ShapeEnvelope>,
}

impl CountyIndex {
    pub fn build(shapes: &[CountyShape]) -> Self {
        let items: Vec<ShapeEnvelope> = shapes
            .iter()
            .enumerate()
            .filter_map(|(i, shape)| {
                let rect = shape.outline.bounding_rect()?;
                Some(ShapeEnvelope {
                    index: i,
                    aabb: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
                })
            })
            .collect();
        Self {
            tree: RTree::bulk_load(items),
        }
    }

    /// Position of the shape under surface coordinate `(x, y)`.
    pub fn locate(&self, shapes: &[CountyShape], x: f64, y: f64) -> Option<usize> {
        let point = Point::new(x, y);
        self.tree
            .locate_in_envelope_intersecting(&AABB::from_point([x, y]))
            .map(|candidate| candidate.index)
            .filter(|&i| shapes.get(i).is_some_and(|s| s.outline.contains(&point)))
            .min()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CountyId, Rgb};
    use geo::{polygon, MultiPolygon};

    fn square(id: u64, x0: f64) -> CountyShape {
        CountyShape {
            fips: Some(CountyId::Numeric(id)),
            outline: MultiPolygon::new(vec![polygon![
                (x: x0, y: 0.0), (x: x0 + 10.0, y: 0.0), (x: x0 + 10.0, y: 10.0), (x: x0, y: 10.0)
            ]]),
            fill: Rgb(0, 0, 0),
            education: 0.0,
            record: None,
        }
    }

    #[test]
    fn locates_the_containing_shape() {
        let shapes = vec![square(1, 0.0), square(2, 10.0), square(3, 30.0)];
        let index = CountyIndex::build(&shapes);
        assert_eq!(index.len(), 3);
        assert_eq!(index.locate(&shapes, 5.0, 5.0), Some(0));
        assert_eq!(index.locate(&shapes, 15.0, 2.0), Some(1));
        assert_eq!(index.locate(&shapes, 25.0, 5.0), None);
        assert_eq!(index.locate(&shapes, 35.0, 50.0), None);
    }

    #[test]
    fn empty_outlines_are_not_indexed() {
        let mut empty = square(9, 0.0);
        empty.outline = MultiPolygon::new(Vec::new());
        let index = CountyIndex::build(&[empty]);
        assert!(index.is_empty());
    }
}
