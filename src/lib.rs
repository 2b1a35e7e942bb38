#![doc = "District census statistics: boundary membership, areal apportionment and an incremental census cache"]
mod common;
mod geom;

pub mod apportion;
pub mod census;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod resolve;
pub mod store;
pub mod units;

#[doc(inline)]
pub use apportion::{Apportioned, Apportioner, Rounding};

#[doc(inline)]
pub use error::StatError;

#[doc(inline)]
pub use geom::{read_geojson_features, write_geojson_features, Feature};

#[doc(inline)]
pub use resolve::{MembershipResolver, DEFAULT_MIN_OVERLAP_SHARE};

#[doc(inline)]
pub use store::{RecordKey, RecordStore};

#[doc(inline)]
pub use units::{Boundary, FieldValues, GeoId, GeoLevel, GeoUnit};
