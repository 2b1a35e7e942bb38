use anyhow::{anyhow, Result};
use indicatif::ProgressBar;
use tracing::debug;

use crate::{
    apportion::{Apportioned, Apportioner, Rounding, DEFAULT_ROUNDING},
    census::{classify, Category},
    store::{RecordKey, RecordStore},
    units::{FieldValues, GeoLevel, GeoUnit},
};

/// Turns fetched raw census records into class values at all three levels.
///
/// Block groups are classified from their own records. Precincts are always
/// apportioned from the classified block groups. The district is classified from
/// its own record when the census reports it, otherwise apportioned with its
/// boundary as the sole target. Everything written back is an integer.
#[derive(Debug, Clone)]
pub struct Assembler<'a> {
    year: u16,
    district: &'a GeoUnit,
    census_district: bool,
    block_groups: &'a [GeoUnit],
    precincts: &'a [GeoUnit],
    rounding: Rounding,
    progress: ProgressBar,
}

impl<'a> Assembler<'a> {
    /// `block_groups` and `precincts` are the resolved members of `district`.
    pub fn new(
        year: u16,
        district: &'a GeoUnit,
        census_district: bool,
        block_groups: &'a [GeoUnit],
        precincts: &'a [GeoUnit],
    ) -> Self {
        Self {
            year,
            district,
            census_district,
            block_groups,
            precincts,
            rounding: DEFAULT_ROUNDING,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    /// Advanced once per block group and once per apportioned target.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Units processed per category, for sizing a progress bar.
    pub fn units_per_category(&self) -> u64 {
        let district = if self.census_district { 0 } else { 1 };
        (self.block_groups.len() + self.precincts.len() + district) as u64
    }

    /// Classify and apportion one category from the raw records in `raw`,
    /// merging the results into `out`.
    pub fn assemble(&self, raw: &RecordStore, out: &mut RecordStore, category: &Category) -> Result<()> {
        let mut sources = Vec::with_capacity(self.block_groups.len());
        for unit in self.block_groups {
            let key = RecordKey::new(self.year, GeoLevel::BlockGroup, unit.id.as_str());
            let values = self.classify_record(raw, &key, category)?;
            out.merge(key, self.integers(&values));
            sources.push(unit.with_values(values));
            self.progress.inc(1);
        }

        let apportioner = Apportioner::new()
            .with_non_apportionable(category.non_apportionable.iter().copied())
            .with_rounding(self.rounding)
            .with_progress(self.progress.clone());

        if !self.precincts.is_empty() {
            let targets = self.precincts.iter()
                .map(|p| (p.id.clone(), p.geometry.as_ref()))
                .collect::<Vec<_>>();
            for result in apportioner.apportion(&sources, &targets) {
                out.merge(RecordKey::new(self.year, GeoLevel::Precinct, result.id.as_str()), to_values(result));
            }
        }

        let district_key = RecordKey::new(self.year, GeoLevel::District, self.district.id.as_str());
        if self.census_district {
            let values = self.classify_record(raw, &district_key, category)?;
            out.merge(district_key, self.integers(&values));
        } else {
            let target = [(self.district.id.clone(), self.district.geometry.as_ref())];
            for result in apportioner.apportion(&sources, &target) {
                out.merge(district_key.clone(), to_values(result));
            }
        }

        debug!(
            year = self.year,
            category = category.name,
            block_groups = self.block_groups.len(),
            precincts = self.precincts.len(),
            synthesized = !self.census_district,
            "assembled category"
        );
        Ok(())
    }

    fn classify_record(&self, raw: &RecordStore, key: &RecordKey, category: &Category) -> Result<FieldValues> {
        let record = raw.get(key)
            .ok_or_else(|| anyhow!("No {} census record for {} {}", key.year, key.level, key.unit))?;
        Ok(classify(&key.unit, record, category)?.into_values())
    }

    fn integers(&self, values: &FieldValues) -> FieldValues {
        values.iter().map(|(k, v)| (k.clone(), self.rounding.apply(*v) as f64)).collect()
    }
}

fn to_values(result: Apportioned) -> FieldValues {
    result.values.into_iter().map(|(k, v)| (k, v as f64)).collect()
}
