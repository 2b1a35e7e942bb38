mod geo_id;
mod geo_level;
mod unit;

pub use geo_id::{BlockGroupKey, GeoId};
pub use geo_level::GeoLevel;
pub use unit::{Boundary, FieldValues, GeoUnit};
