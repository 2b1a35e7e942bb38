use geo::{BoundingRect, MultiPolygon};
use rstar::RTree;

use super::{bbox::envelope_of, BoundingBox, REFERENCE_EPSG};

/// A collection of MultiPolygons with an R-tree over their bounding boxes.
/// Shapes with no bounding box (empty geometries) are stored but never indexed.
#[derive(Debug, Clone)]
pub struct Geometries {
    shapes: Vec<MultiPolygon<f64>>,
    rtree: RTree<BoundingBox>,
    epsg: Option<u32>, // EPSG code, if known
}

impl Geometries {
    /// Construct a Geometries object from a vector of MultiPolygons.
    pub fn new(shapes: Vec<MultiPolygon<f64>>, epsg: Option<u32>) -> Self {
        Self {
            rtree: RTree::bulk_load(
                shapes.iter().enumerate()
                    .filter_map(|(i, shape)| shape.bounding_rect().map(|rect| BoundingBox::new(i, rect)))
                    .collect()
            ),
            shapes,
            epsg,
        }
    }

    /// Get a reference to the list of MultiPolygons.
    #[inline] pub fn shapes(&self) -> &[MultiPolygon<f64>] { &self.shapes }

    /// Consume into the list of MultiPolygons.
    #[inline] pub fn into_shapes(self) -> Vec<MultiPolygon<f64>> { self.shapes }

    /// Get the EPSG code, or default to the reference system if unknown.
    #[inline] pub fn epsg(&self) -> u32 { self.epsg.unwrap_or(REFERENCE_EPSG) }

    /// Indices of shapes whose bounding box intersects the bounding box of `target`.
    /// This is a prefilter only: callers still run exact predicates on the candidates.
    pub fn candidates(&self, target: &MultiPolygon<f64>) -> Vec<usize> {
        let Some(rect) = target.bounding_rect() else { return Vec::new() };
        let mut indices = self.rtree
            .locate_in_envelope_intersecting(&envelope_of(&rect))
            .map(|bb| bb.idx())
            .collect::<Vec<_>>();
        indices.sort_unstable();
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]])
    }

    #[test]
    fn candidates_prefilter_by_bounding_box() {
        let geoms = Geometries::new(vec![
            square(0.0, 0.0, 1.0, 1.0),
            square(5.0, 5.0, 6.0, 6.0),
            square(0.5, 0.5, 2.0, 2.0),
        ], None);

        assert_eq!(geoms.candidates(&square(0.0, 0.0, 1.5, 1.5)), vec![0, 2]);
        assert!(geoms.candidates(&square(10.0, 10.0, 11.0, 11.0)).is_empty());
    }

    #[test]
    fn empty_shapes_are_never_candidates() {
        let geoms = Geometries::new(vec![MultiPolygon(vec![]), square(0.0, 0.0, 1.0, 1.0)], Some(4269));
        assert_eq!(geoms.candidates(&square(-1.0, -1.0, 2.0, 2.0)), vec![1]);
        assert_eq!(geoms.epsg(), 4269);
    }
}
