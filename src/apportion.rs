use std::collections::{BTreeMap, BTreeSet};

use geo::{Area, Contains, InteriorPoint, MultiPolygon};
use indicatif::ProgressBar;
use tracing::debug;

use crate::{
    geom::{intersection_area, Geometries},
    units::{GeoId, GeoUnit},
};

/// How accumulated fractional estimates become published integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Drop the fractional part. Published figures were produced this way.
    Truncate,
    /// Round half away from zero.
    Round,
}

pub const DEFAULT_ROUNDING: Rounding = Rounding::Truncate;

impl Rounding {
    #[inline]
    pub fn apply(self, value: f64) -> i64 {
        match self {
            Rounding::Truncate => value.trunc() as i64,
            Rounding::Round => value.round() as i64,
        }
    }
}

/// Integer field values for one target after apportionment.
#[derive(Debug, Clone, PartialEq)]
pub struct Apportioned {
    pub id: GeoId,
    pub values: BTreeMap<String, i64>,
}

/// Redistributes additive attributes from source units onto target geometries
/// in proportion to overlapping area.
#[derive(Debug, Clone)]
pub struct Apportioner {
    non_apportionable: BTreeSet<String>,
    rounding: Rounding,
    progress: ProgressBar,
}

impl Default for Apportioner {
    fn default() -> Self {
        Self { non_apportionable: BTreeSet::new(), rounding: DEFAULT_ROUNDING, progress: ProgressBar::hidden() }
    }
}

impl Apportioner {
    pub fn new() -> Self { Self::default() }

    /// Fields copied from the authoritative source instead of being summed (e.g. medians).
    pub fn with_non_apportionable<I, S>(mut self, fields: I) -> Self
    where I: IntoIterator<Item = S>, S: Into<String> {
        self.non_apportionable = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    /// Advance `progress` once per processed target.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Apportion every field of `sources` onto each target.
    ///
    /// For target T and source U with positive overlap, `share = area(U ∩ T) / area(U)`
    /// and `T[f] += U[f] * share`. Accumulated values are converted with the rounding
    /// policy only after all sources are processed. Every target carries every
    /// apportionable field seen on any source, zero when nothing overlaps.
    pub fn apportion(&self, sources: &[GeoUnit], targets: &[(GeoId, &MultiPolygon<f64>)]) -> Vec<Apportioned> {
        let geoms = Geometries::new(sources.iter().map(|u| (*u.geometry).clone()).collect(), None);
        let source_areas = geoms.shapes().iter().map(|s| s.unsigned_area()).collect::<Vec<_>>();

        let fields = sources.iter()
            .flat_map(|u| u.values.keys())
            .filter(|f| !self.non_apportionable.contains(*f))
            .cloned()
            .collect::<BTreeSet<_>>();

        let mut out = Vec::with_capacity(targets.len());
        for (id, target) in targets {
            let mut totals = fields.iter().map(|f| (f.clone(), 0.0)).collect::<BTreeMap<_, _>>();
            let mut overlaps: Vec<(usize, f64)> = Vec::new();

            for i in geoms.candidates(target) {
                if source_areas[i] <= 0.0 { continue }
                let inter = intersection_area(&sources[i].geometry, target);
                if inter <= 0.0 { continue }

                let share = inter / source_areas[i];
                for (field, value) in &sources[i].values {
                    if let Some(total) = totals.get_mut(field) {
                        *total += value * share;
                    }
                }
                overlaps.push((i, inter));
            }

            let mut values = totals.into_iter()
                .map(|(field, total)| (field, self.rounding.apply(total)))
                .collect::<BTreeMap<_, _>>();

            if !self.non_apportionable.is_empty() {
                if let Some(i) = authoritative_source(sources, &source_areas, target, &overlaps) {
                    for field in &self.non_apportionable {
                        if let Some(value) = sources[i].values.get(field) {
                            values.insert(field.clone(), *value as i64);
                        }
                    }
                }
            }

            debug!(target = %id, sources = overlaps.len(), "apportioned target");
            out.push(Apportioned { id: id.clone(), values });
            self.progress.inc(1);
        }
        out
    }
}

/// The source whose values stand for the target on non-apportionable fields:
/// the smallest overlapping source containing the target's interior point,
/// otherwise the source with the largest overlap.
fn authoritative_source(
    sources: &[GeoUnit],
    source_areas: &[f64],
    target: &MultiPolygon<f64>,
    overlaps: &[(usize, f64)],
) -> Option<usize> {
    let enclosing = target.interior_point().and_then(|pt| {
        overlaps.iter()
            .map(|&(i, _)| i)
            .filter(|&i| sources[i].geometry.contains(&pt))
            .min_by(|&a, &b| source_areas[a].total_cmp(&source_areas[b]))
    });

    enclosing.or_else(|| {
        overlaps.iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|&(i, _)| i)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]])
    }

    fn source(id: &str, shape: MultiPolygon<f64>, values: &[(&str, f64)]) -> GeoUnit {
        GeoUnit::new(GeoId::block_group(id), shape)
            .with_values(values.iter().map(|(k, v)| (k.to_string(), *v)).collect())
    }

    #[test]
    fn precinct_straddling_two_block_groups() {
        let sources = [
            source("A", rect(0.0, 0.0, 10.0, 5.0), &[("population", 100.0)]),
            source("B", rect(0.0, 5.0, 10.0, 10.0), &[("population", 50.0)]),
        ];
        let precinct = rect(0.0, 3.0, 10.0, 7.0);

        let result = Apportioner::new().apportion(&sources, &[(GeoId::precinct("P"), &precinct)]);
        assert_eq!(result[0].values["population"], 60);
    }

    #[test]
    fn fractions_are_truncated_not_rounded() {
        let sources = [source("A", rect(0.0, 0.0, 10.0, 5.0), &[("population", 99.0)])];
        let target = rect(0.0, 3.0, 10.0, 5.0); // 40% of A

        let truncated = Apportioner::new().apportion(&sources, &[(GeoId::precinct("P"), &target)]);
        assert_eq!(truncated[0].values["population"], 39);

        let rounded = Apportioner::new()
            .with_rounding(Rounding::Round)
            .apportion(&sources, &[(GeoId::precinct("P"), &target)]);
        assert_eq!(rounded[0].values["population"], 40);
    }

    #[test]
    fn touching_source_contributes_nothing() {
        let sources = [source("A", rect(10.0, 0.0, 20.0, 10.0), &[("population", 100.0)])];
        let target = rect(0.0, 0.0, 10.0, 10.0);

        let result = Apportioner::new().apportion(&sources, &[(GeoId::district("D"), &target)]);
        assert_eq!(result[0].values["population"], 0);
    }

    #[test]
    fn medians_are_copied_from_enclosing_source() {
        let sources = [
            source("big", rect(0.0, 0.0, 10.0, 10.0), &[("median", 40000.0), ("households", 100.0)]),
            source("small", rect(0.0, 0.0, 4.0, 4.0), &[("median", 75000.0), ("households", 40.0)]),
        ];
        let target = rect(1.0, 1.0, 3.0, 3.0);

        let result = Apportioner::new()
            .with_non_apportionable(["median"])
            .apportion(&sources, &[(GeoId::precinct("P"), &target)]);

        assert_eq!(result[0].values["median"], 75000);
        // 4/100 of big + 4/16 of small = 4 + 10
        assert_eq!(result[0].values["households"], 14);
    }

    #[test]
    fn progress_advances_per_target() {
        let sources = [source("A", rect(0.0, 0.0, 1.0, 1.0), &[("population", 1.0)])];
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let b = rect(5.0, 5.0, 6.0, 6.0);
        let progress = ProgressBar::hidden();

        Apportioner::new()
            .with_progress(progress.clone())
            .apportion(&sources, &[(GeoId::precinct("a"), &a), (GeoId::precinct("b"), &b)]);
        assert_eq!(progress.position(), 2);
    }
}
