mod bbox;
mod geom;
mod io;
mod overlap;
mod proj;

use bbox::BoundingBox;
pub use geom::Geometries;
pub use io::{read_geojson_features, read_shapefile_features, write_geojson_features, Feature};
pub use overlap::{contact, intersection_area, overlap_share, Contact};
pub use proj::{REFERENCE_EPSG, SOURCE_EPSG};
