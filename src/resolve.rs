use std::{collections::{BTreeMap, BTreeSet}, sync::Arc};

use geo::{Area, MultiPolygon};
use tracing::debug;

use crate::{
    geom::{contact, overlap_share, Contact, Geometries},
    units::{Boundary, GeoId, GeoUnit},
};

/// Minimum share of a unit's area that must fall inside a boundary for the unit to count as a member.
pub const DEFAULT_MIN_OVERLAP_SHARE: f64 = 0.10;

/// Decides which candidate units belong inside a target boundary.
#[derive(Debug, Clone, Copy)]
pub struct MembershipResolver {
    min_share: f64,
}

impl Default for MembershipResolver {
    fn default() -> Self { Self { min_share: DEFAULT_MIN_OVERLAP_SHARE } }
}

impl MembershipResolver {
    pub fn new(min_share: f64) -> Self {
        debug_assert!((0.0..=1.0).contains(&min_share), "min_share must be in [0, 1]");
        Self { min_share }
    }

    /// Resolve the members of `boundary` among `candidates`.
    ///
    /// Units that only touch the boundary are never members, whatever their
    /// computed share. Of the rest, a unit is a member iff its overlap share is
    /// at least the threshold. Zero-area units are never members.
    pub fn resolve(&self, id: GeoId, boundary: Arc<MultiPolygon<f64>>, candidates: &[GeoUnit]) -> Boundary {
        let geoms = Geometries::new(candidates.iter().map(|u| (*u.geometry).clone()).collect(), None);

        let mut touching = BTreeSet::new();
        let mut intersecting = BTreeMap::new();
        for i in geoms.candidates(&boundary) {
            let unit = &candidates[i];
            match contact(&unit.geometry, &boundary) {
                Contact::Touches => { touching.insert(unit.id.clone()); }
                Contact::Intersects => { intersecting.insert(unit.id.clone(), unit); }
                Contact::Disjoint => {}
            }
        }

        let overlapping = intersecting.keys().cloned().collect::<BTreeSet<_>>();
        let members = overlapping.difference(&touching)
            .filter(|unit_id| {
                let unit = intersecting[*unit_id];
                if unit.geometry.unsigned_area() <= 0.0 { return false }
                overlap_share(&unit.geometry, &boundary).is_some_and(|share| share >= self.min_share)
            })
            .cloned()
            .collect::<BTreeSet<_>>();

        debug!(
            boundary = %id,
            candidates = candidates.len(),
            touching = touching.len(),
            overlapping = overlapping.len(),
            members = members.len(),
            "resolved boundary membership"
        );

        Boundary { id, geometry: boundary, members }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]])
    }

    fn unit(id: &str, shape: MultiPolygon<f64>) -> GeoUnit {
        GeoUnit::new(GeoId::block_group(id), shape)
    }

    fn district() -> Arc<MultiPolygon<f64>> { Arc::new(rect(0.0, 0.0, 10.0, 10.0)) }

    fn ids(boundary: &Boundary) -> Vec<&str> {
        boundary.members.iter().map(|id| id.as_str()).collect()
    }

    #[test]
    fn interior_unit_is_member_regardless_of_threshold() {
        let units = [unit("a", rect(2.0, 2.0, 4.0, 4.0))];
        for threshold in [0.0, 0.5, 1.0] {
            let boundary = MembershipResolver::new(threshold).resolve(GeoId::district("d"), district(), &units);
            assert_eq!(ids(&boundary), vec!["a"]);
        }
    }

    #[test]
    fn edge_touching_unit_is_excluded() {
        let units = [
            unit("east", rect(10.0, 0.0, 20.0, 10.0)),
            unit("corner", rect(10.0, 10.0, 12.0, 12.0)),
        ];
        let boundary = MembershipResolver::new(0.0).resolve(GeoId::district("d"), district(), &units);
        assert!(boundary.members.is_empty());
    }

    #[test]
    fn share_at_threshold_is_included() {
        // 1x10 strip of a 10x10 unit: share is exactly 0.1
        let units = [unit("a", rect(-9.0, 0.0, 1.0, 10.0))];
        let boundary = MembershipResolver::default().resolve(GeoId::district("d"), district(), &units);
        assert_eq!(ids(&boundary), vec!["a"]);
    }

    #[test]
    fn share_below_threshold_is_excluded() {
        // 0.5x10 strip of a 10x10 unit: share 0.05 against the default 0.10
        let units = [unit("a", rect(-9.5, 0.0, 0.5, 10.0))];
        let boundary = MembershipResolver::default().resolve(GeoId::district("d"), district(), &units);
        assert!(boundary.members.is_empty());

        let lenient = MembershipResolver::new(0.05).resolve(GeoId::district("d"), district(), &units);
        assert_eq!(ids(&lenient), vec!["a"]);
    }

    #[test]
    fn zero_area_unit_is_excluded() {
        let sliver = unit("flat", rect(2.0, 5.0, 8.0, 5.0));
        let boundary = MembershipResolver::new(0.0).resolve(GeoId::district("d"), district(), &[sliver]);
        assert!(boundary.members.is_empty());
    }

    #[test]
    fn members_are_selected_in_input_order() {
        let units = [
            unit("b", rect(1.0, 1.0, 2.0, 2.0)),
            unit("far", rect(50.0, 50.0, 51.0, 51.0)),
            unit("a", rect(3.0, 3.0, 4.0, 4.0)),
        ];
        let boundary = MembershipResolver::default().resolve(GeoId::district("d"), district(), &units);
        let selected = boundary.select(&units).iter().map(|u| u.id.as_str()).collect::<Vec<_>>();
        assert_eq!(selected, vec!["b", "a"]);
    }
}
