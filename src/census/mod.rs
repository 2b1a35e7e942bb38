mod cache;
mod classes;
mod classify;
mod client;
mod tiger;

pub use cache::{CensusCache, FetchRequest, FetchStatus};
pub use classes::{AttributeClass, Category, CATEGORIES, AGE, EDUCATION, INCOME, RACE};
pub use classify::{classify, Classified};
pub use client::{CensusApiClient, CensusRow, StatsClient};
pub(crate) use tiger::{block_groups_url, district_url, GEOID_FIELD};
