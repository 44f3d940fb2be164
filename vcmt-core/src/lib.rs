// VCMT Core Library
//
// Provides VCMT competency-mapping template processing: unit code and
// section extraction, evidence matching, statement composition, and
// destination-table filling with DOCX round-tripping.

pub mod types;
pub mod normalize;
pub mod docx;
pub mod rules;
pub mod matcher;
pub mod compose;
pub mod util;
pub mod session;
pub mod config;
pub mod processor;

// Re-export main types and functions for easy use
pub use types::*;
pub use config::ExtractionConfig;
pub use docx::{DocxDocument, DocxError};
pub use processor::VcmtProcessor;
pub use session::{BlockOutcome, Session};
