//! Whitespace normalization and the document text stream.
//!
//! Every extraction heuristic downstream works on the same flattened view of
//! the document: body paragraphs first, then each table row by row, cell by
//! cell. Adjacent duplicate lines are dropped (merged table cells repeat
//! their text for every spanned grid column).

use crate::docx::DocxDocument;
use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Collapse every whitespace run (including newlines) to a single space and
/// trim. Total function: never fails, empty input yields empty output.
pub fn normalise_space(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s, " ").trim().to_string()
}

/// Flatten a document into its ordered sequence of non-empty text lines:
/// all top-level paragraphs, then for each table, each row, each cell, the
/// paragraphs within the cell. Adjacent identical lines are deduplicated —
/// adjacency only, not globally.
pub fn doc_text_lines(doc: &DocxDocument) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();

    let push = |text: &str, lines: &mut Vec<String>| {
        if text.is_empty() {
            return;
        }
        if lines.last().map(String::as_str) == Some(text) {
            return;
        }
        lines.push(text.to_string());
    };

    for p in &doc.paragraphs {
        push(p, &mut lines);
    }
    for table in &doc.tables {
        for row in &table.rows {
            for cell in &row.cells {
                for p in &cell.paragraphs {
                    push(p, &mut lines);
                }
            }
        }
    }
    lines
}

/// Same stream, pre-normalized, blank lines dropped.
pub fn normalised_text_lines(doc: &DocxDocument) -> Vec<String> {
    doc_text_lines(doc)
        .iter()
        .map(|l| normalise_space(l))
        .filter(|l| !l.is_empty())
        .collect()
}
