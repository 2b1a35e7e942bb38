use std::path::PathBuf;

use thiserror::Error;

/// Domain failures that callers may want to match on.
/// Everything else travels as `anyhow::Error` with context attached.
#[derive(Debug, Error)]
pub enum StatError {
    /// A county batch came back without a row for one of the requested block groups.
    #[error("no census row for block group {geoid} in county {county} (tract {tract}, block group {block_group})")]
    UnmatchedBlockGroup {
        geoid: String,
        county: String,
        tract: String,
        block_group: String,
    },

    /// A unit lacks a raw field that a class needs.
    #[error("field {field} is missing for unit {unit}")]
    MissingField { unit: String, field: String },

    /// The statistics client returned something that is not a number.
    #[error("malformed value {value:?} for field {field} of unit {unit}")]
    MalformedValue { unit: String, field: String, value: String },

    #[error("unknown state or territory postal code: {0}")]
    UnknownState(String),

    #[error("no boundary with GEOID {geoid} in {}", path.display())]
    NoBoundary { geoid: String, path: PathBuf },
}
