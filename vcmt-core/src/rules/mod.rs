// Heuristic extraction rules over the flattened document text stream.
//
// Every rule here is total: a miss yields an empty field or an unassigned
// role, never an error. The numeric thresholds live in ExtractionConfig.

pub mod table_locator;
pub mod unit_extraction;

pub use table_locator::{eligible_tables, list_tables, locate_part_tables};
pub use unit_extraction::UnitExtractor;
