use geo::{Area, BooleanOps, MultiPolygon, Relate};

/// How a unit meets a target, from one DE-9IM relate call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    Disjoint,
    /// Boundaries meet but interiors do not (shared edge or corner).
    Touches,
    /// Interiors meet.
    Intersects,
}

/// Classify the contact between `unit` and `target`.
pub fn contact(unit: &MultiPolygon<f64>, target: &MultiPolygon<f64>) -> Contact {
    let im = unit.relate(target);
    if im.is_touches() {
        Contact::Touches
    } else if im.is_intersects() {
        Contact::Intersects
    } else {
        Contact::Disjoint
    }
}

/// Area of `a ∩ b`.
#[inline]
pub fn intersection_area(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> f64 {
    a.intersection(b).unsigned_area()
}

/// Fraction of `unit`'s area that lies inside `target`.
/// Returns None for zero-area units.
pub fn overlap_share(unit: &MultiPolygon<f64>, target: &MultiPolygon<f64>) -> Option<f64> {
    let area = unit.unsigned_area();
    if area <= 0.0 { return None }
    Some(intersection_area(unit, target) / area)
}
