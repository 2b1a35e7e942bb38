//! Derived documents: class values at every level, the category schema,
//! election results and the per-category sheets.

mod assemble;
mod election;
mod schema;
mod sheets;

pub use assemble::Assembler;
pub use election::ElectionResults;
pub use schema::{build_schema, CategorySchema, ELECTION_CATEGORY};
pub use sheets::{category_sheet, write_sheets};
