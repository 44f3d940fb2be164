//! Minimal DOCX document model and round-trip I/O.
//!
//! A VCMT template is a WordprocessingML package. We only need two contracts
//! with it: read-only traversal of paragraph and table-cell text for
//! extraction, and row-level mutation (fill a blank row, append a row or
//! table) for writing. docx-rs is writer-only, so both directions are done
//! by hand: `zip` for the container, `quick-xml` for `word/document.xml`.
//!
//! Load and save are the only operations allowed to fail hard; everything
//! downstream of a parsed document degrades softly.

mod reader;
mod writer;

pub use reader::{parse_document_xml, read_docx};
pub use writer::{build_docx, write_docx, CellWrite, DocxFiller, FillPlan, NewTable, RowAppend};

use crate::normalize::normalise_space;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocxError {
    #[error("could not open document container: {0}")]
    Container(#[from] zip::result::ZipError),
    #[error("could not read document part: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse document XML: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Parsed document: top-level paragraphs plus top-level tables, in document
/// order. Formatting, runs and styles are not modeled — the write path
/// rewrites the original XML in place instead of regenerating it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocxDocument {
    pub paragraphs: Vec<String>,
    pub tables: Vec<DocxTable>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocxTable {
    pub rows: Vec<DocxRow>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocxRow {
    pub cells: Vec<DocxCell>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocxCell {
    pub paragraphs: Vec<String>,
}

impl DocxCell {
    pub fn from_text(text: &str) -> Self {
        Self {
            paragraphs: vec![text.to_string()],
        }
    }

    pub fn text(&self) -> String {
        self.paragraphs.join(" ")
    }

    pub fn is_blank(&self) -> bool {
        normalise_space(&self.text()).is_empty()
    }
}

impl DocxRow {
    pub fn from_values(values: &[String], cols: usize) -> Self {
        let cells = (0..cols)
            .map(|i| DocxCell::from_text(values.get(i).map(String::as_str).unwrap_or("")))
            .collect();
        Self { cells }
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(DocxCell::is_blank)
    }
}

impl DocxTable {
    /// Column count: widest row wins (merged cells make row widths uneven).
    pub fn col_count(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0)
    }

    pub fn header_cells(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|r| r.cells.iter().map(|c| normalise_space(&c.text())).collect())
            .unwrap_or_default()
    }
}
