mod district;
mod paths;
mod settings;

pub use district::{DistrictConfig, LegislativeBody};
pub use paths::RunPaths;
pub use settings::{Settings, DEFAULT_PRECINCT_ID_PROPERTY, DEFAULT_SETTINGS_FILE};
