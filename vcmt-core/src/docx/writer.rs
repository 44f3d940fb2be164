//! DOCX writing: row-level table mutation and package re-export.
//!
//! The write path never regenerates the document — it streams the original
//! `word/document.xml` through quick-xml, applying a [`FillPlan`] (cell
//! rewrites, appended rows, appended fallback tables) and repacks the ZIP
//! with every other part copied byte-for-byte. Styling and content outside
//! the touched cells survive untouched.

use super::{DocxDocument, DocxError, DocxRow, DocxTable};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

// ===== FILL PLANNING =====

/// Overwrite one cell of an existing table (positional, header row is 0).
#[derive(Debug, Clone)]
pub struct CellWrite {
    pub table: usize,
    pub row: usize,
    pub col: usize,
    pub text: String,
}

/// Append a row to an existing table.
#[derive(Debug, Clone)]
pub struct RowAppend {
    pub table: usize,
    pub values: Vec<String>,
    pub cols: usize,
}

/// A fallback destination table appended at the end of the body.
#[derive(Debug, Clone)]
pub struct NewTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub cols: usize,
}

/// Everything the XML rewrite pass has to apply.
#[derive(Debug, Clone, Default)]
pub struct FillPlan {
    pub cell_writes: Vec<CellWrite>,
    pub row_appends: Vec<RowAppend>,
    pub new_tables: Vec<NewTable>,
}

impl FillPlan {
    pub fn is_empty(&self) -> bool {
        self.cell_writes.is_empty() && self.row_appends.is_empty() && self.new_tables.is_empty()
    }
}

/// Plans row insertions against a working copy of the document model and
/// records the matching XML edits.
///
/// Insertion prefers the first fully blank data row (header excluded) and
/// falls back to appending. No deduplication happens here: inserting the
/// same values twice produces two rows — tracking what was already written
/// is the caller's job.
pub struct DocxFiller {
    doc: DocxDocument,
    plan: FillPlan,
    original_tables: usize,
}

impl DocxFiller {
    pub fn new(doc: DocxDocument) -> Self {
        let original_tables = doc.tables.len();
        Self {
            doc,
            plan: FillPlan::default(),
            original_tables,
        }
    }

    pub fn doc(&self) -> &DocxDocument {
        &self.doc
    }

    pub fn into_plan(self) -> FillPlan {
        self.plan
    }

    /// Append a new 4-column destination table with the given header row.
    /// Returns its table index (valid for subsequent `insert_row` calls).
    pub fn append_table(&mut self, header: &[&str]) -> usize {
        let cols = header.len();
        let header: Vec<String> = header.iter().map(|h| h.to_string()).collect();

        let mut table = DocxTable::default();
        table.rows.push(DocxRow::from_values(&header, cols));
        self.doc.tables.push(table);

        self.plan.new_tables.push(NewTable {
            header,
            rows: Vec::new(),
            cols,
        });
        self.doc.tables.len() - 1
    }

    /// Insert `values` into the first blank data row of the table, else
    /// append a new row. Excess values are ignored; excess cells untouched.
    pub fn insert_row(&mut self, table_idx: usize, values: &[String]) {
        let Some(table) = self.doc.tables.get_mut(table_idx) else {
            return;
        };

        if table_idx >= self.original_tables {
            // Fallback table: it has no blank rows by construction, rows are
            // emitted wholesale with the table XML
            let cols = table.col_count();
            table.rows.push(DocxRow::from_values(values, cols));
            let new_idx = table_idx - self.original_tables;
            if let Some(new_table) = self.plan.new_tables.get_mut(new_idx) {
                new_table.rows.push(values.to_vec());
            }
            return;
        }

        // First fully blank data row, skipping the header row
        let blank = table
            .rows
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, row)| row.is_blank())
            .map(|(i, _)| i);

        match blank {
            Some(row_idx) => {
                let row = &mut table.rows[row_idx];
                for (col, value) in values.iter().enumerate() {
                    if col >= row.cells.len() {
                        break;
                    }
                    row.cells[col].paragraphs = vec![value.clone()];
                    self.plan.cell_writes.push(CellWrite {
                        table: table_idx,
                        row: row_idx,
                        col,
                        text: value.clone(),
                    });
                }
            }
            None => {
                let cols = table.col_count();
                table.rows.push(DocxRow::from_values(values, cols));
                self.plan.row_appends.push(RowAppend {
                    table: table_idx,
                    values: values.to_vec(),
                    cols,
                });
            }
        }
    }
}

// ===== XML REWRITE =====

/// Apply a fill plan to original DOCX bytes, returning the new package.
pub fn write_docx(original: &[u8], plan: &FillPlan) -> Result<Vec<u8>, DocxError> {
    let xml = super::reader::read_document_part(original)?;
    let rewritten = rewrite_document_xml(&xml, plan)?;
    repack(original, &rewritten)
}

fn rewrite_document_xml(xml: &str, plan: &FillPlan) -> Result<Vec<u8>, DocxError> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    let mut writer = Writer::new(Vec::new());
    let mut buf = Vec::new();

    let mut table_depth = 0usize;
    let mut tables_seen = 0usize; // top-level tables passed so far
    let mut row_counter = 0usize;
    let mut cell_counter = 0usize;
    let mut current_row = 0usize;
    // Set while inside a cell scheduled for rewrite: original paragraphs of
    // that cell are dropped, the replacement is emitted before </w:tc>
    let mut pending_cell_text: Option<String> = None;

    loop {
        let ev = reader.read_event_into(&mut buf)?.into_owned();
        buf.clear();

        match &ev {
            Event::Eof => break,
            Event::Start(e) => {
                match e.name().as_ref() {
                    b"w:tbl" => {
                        table_depth += 1;
                        if table_depth == 1 {
                            tables_seen += 1;
                            row_counter = 0;
                        }
                    }
                    b"w:tr" if table_depth == 1 => {
                        current_row = row_counter;
                        row_counter += 1;
                        cell_counter = 0;
                    }
                    b"w:tc" if table_depth == 1 => {
                        let col = cell_counter;
                        cell_counter += 1;
                        let table = tables_seen - 1;
                        pending_cell_text = plan
                            .cell_writes
                            .iter()
                            .find(|w| w.table == table && w.row == current_row && w.col == col)
                            .map(|w| w.text.clone());
                    }
                    b"w:p" if pending_cell_text.is_some() => {
                        // Drop the original cell content
                        drain_element(&mut reader)?;
                        continue;
                    }
                    _ => {}
                }
                writer.write_event(ev)?;
            }
            Event::Empty(e) => {
                if e.name().as_ref() == b"w:p" && pending_cell_text.is_some() {
                    continue;
                }
                writer.write_event(ev)?;
            }
            Event::End(e) => {
                match e.name().as_ref() {
                    b"w:tbl" => {
                        if table_depth == 1 {
                            // Rows appended to this table go just before it closes
                            let table = tables_seen - 1;
                            for append in plan.row_appends.iter().filter(|a| a.table == table) {
                                emit_row(&mut writer, &append.values, append.cols)?;
                            }
                        }
                        table_depth = table_depth.saturating_sub(1);
                    }
                    b"w:tc" if table_depth == 1 => {
                        if let Some(text) = pending_cell_text.take() {
                            emit_paragraph(&mut writer, &text)?;
                        }
                    }
                    b"w:body" => {
                        for table in &plan.new_tables {
                            emit_table(&mut writer, table)?;
                        }
                    }
                    _ => {}
                }
                writer.write_event(ev)?;
            }
            _ => writer.write_event(ev)?,
        }
    }

    Ok(writer.into_inner())
}

/// Consume events until the element just opened closes. Nothing is written.
fn drain_element(reader: &mut Reader<&[u8]>) -> Result<(), DocxError> {
    let mut depth = 1usize;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

fn emit_paragraph<W: Write>(writer: &mut Writer<W>, text: &str) -> Result<(), DocxError> {
    writer.write_event(Event::Start(BytesStart::new("w:p")))?;
    writer.write_event(Event::Start(BytesStart::new("w:r")))?;
    let mut t = BytesStart::new("w:t");
    t.push_attribute(("xml:space", "preserve"));
    writer.write_event(Event::Start(t))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new("w:t")))?;
    writer.write_event(Event::End(BytesEnd::new("w:r")))?;
    writer.write_event(Event::End(BytesEnd::new("w:p")))?;
    Ok(())
}

fn emit_row<W: Write>(writer: &mut Writer<W>, values: &[String], cols: usize) -> Result<(), DocxError> {
    writer.write_event(Event::Start(BytesStart::new("w:tr")))?;
    for col in 0..cols {
        writer.write_event(Event::Start(BytesStart::new("w:tc")))?;
        emit_paragraph(writer, values.get(col).map(String::as_str).unwrap_or(""))?;
        writer.write_event(Event::End(BytesEnd::new("w:tc")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("w:tr")))?;
    Ok(())
}

fn emit_table<W: Write>(writer: &mut Writer<W>, table: &NewTable) -> Result<(), DocxError> {
    writer.write_event(Event::Start(BytesStart::new("w:tbl")))?;

    writer.write_event(Event::Start(BytesStart::new("w:tblPr")))?;
    let mut width = BytesStart::new("w:tblW");
    width.push_attribute(("w:w", "0"));
    width.push_attribute(("w:type", "auto"));
    writer.write_event(Event::Empty(width))?;
    writer.write_event(Event::End(BytesEnd::new("w:tblPr")))?;

    writer.write_event(Event::Start(BytesStart::new("w:tblGrid")))?;
    for _ in 0..table.cols {
        writer.write_event(Event::Empty(BytesStart::new("w:gridCol")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("w:tblGrid")))?;

    emit_row(writer, &table.header, table.cols)?;
    for row in &table.rows {
        emit_row(writer, row, table.cols)?;
    }

    writer.write_event(Event::End(BytesEnd::new("w:tbl")))?;
    Ok(())
}

fn repack(original: &[u8], document_xml: &[u8]) -> Result<Vec<u8>, DocxError> {
    let mut archive = ZipArchive::new(Cursor::new(original))?;
    let mut out = ZipWriter::new(Cursor::new(Vec::new()));

    for i in 0..archive.len() {
        let file = archive.by_index(i)?;
        if file.name() == "word/document.xml" {
            continue;
        }
        out.raw_copy_file(file)?;
    }

    out.start_file("word/document.xml", FileOptions::default())?;
    out.write_all(document_xml)?;

    Ok(out.finish()?.into_inner())
}

// ===== PACKAGE SYNTHESIS =====

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Build a complete DOCX package from a document model. Used to synthesize
/// templates for tests and demos; real templates are rewritten in place.
pub fn build_docx(doc: &DocxDocument) -> Result<Vec<u8>, DocxError> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

    let mut root = BytesStart::new("w:document");
    root.push_attribute(("xmlns:w", WORDML_NS));
    writer.write_event(Event::Start(root))?;
    writer.write_event(Event::Start(BytesStart::new("w:body")))?;

    for p in &doc.paragraphs {
        emit_paragraph(&mut writer, p)?;
    }
    for table in &doc.tables {
        let cols = table.col_count();
        writer.write_event(Event::Start(BytesStart::new("w:tbl")))?;
        writer.write_event(Event::Start(BytesStart::new("w:tblGrid")))?;
        for _ in 0..cols {
            writer.write_event(Event::Empty(BytesStart::new("w:gridCol")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("w:tblGrid")))?;
        for row in &table.rows {
            writer.write_event(Event::Start(BytesStart::new("w:tr")))?;
            for cell in &row.cells {
                writer.write_event(Event::Start(BytesStart::new("w:tc")))?;
                for p in &cell.paragraphs {
                    emit_paragraph(&mut writer, p)?;
                }
                if cell.paragraphs.is_empty() {
                    writer.write_event(Event::Empty(BytesStart::new("w:p")))?;
                }
                writer.write_event(Event::End(BytesEnd::new("w:tc")))?;
            }
            writer.write_event(Event::End(BytesEnd::new("w:tr")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("w:tbl")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("w:body")))?;
    writer.write_event(Event::End(BytesEnd::new("w:document")))?;
    let document_xml = writer.into_inner();

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("[Content_Types].xml", FileOptions::default())?;
    zip.write_all(CONTENT_TYPES_XML.as_bytes())?;
    zip.start_file("_rels/.rels", FileOptions::default())?;
    zip.write_all(RELS_XML.as_bytes())?;
    zip.start_file("word/document.xml", FileOptions::default())?;
    zip.write_all(&document_xml)?;

    Ok(zip.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::read_docx;

    fn blank_template() -> Vec<u8> {
        let mut table = DocxTable::default();
        table.rows.push(DocxRow::from_values(
            &["Qualification".into(), "Year".into(), "Statement".into(), "Evidence".into()],
            4,
        ));
        let no_values: [String; 0] = [];
        table.rows.push(DocxRow::from_values(&no_values, 4)); // blank data row
        let doc = DocxDocument {
            paragraphs: vec!["VCMT template".into()],
            tables: vec![table],
        };
        build_docx(&doc).unwrap()
    }

    #[test]
    fn test_build_then_read_round_trip() {
        let bytes = blank_template();
        let doc = read_docx(&bytes).unwrap();
        assert_eq!(doc.paragraphs[0], "VCMT template");
        assert_eq!(doc.tables[0].col_count(), 4);
        assert!(doc.tables[0].rows[1].is_blank());
    }

    #[test]
    fn test_fill_prefers_blank_row_then_appends() {
        let bytes = blank_template();
        let doc = read_docx(&bytes).unwrap();
        let mut filler = DocxFiller::new(doc);

        let first: Vec<String> =
            ["Cert III", "2019", "stmt", "E123456"].map(String::from).to_vec();
        let second: Vec<String> =
            ["Cert IV", "2021", "stmt2", "E99"].map(String::from).to_vec();
        filler.insert_row(0, &first);
        filler.insert_row(0, &second);

        let plan = filler.into_plan();
        assert_eq!(plan.cell_writes.len(), 4, "first insert fills the blank row");
        assert_eq!(plan.row_appends.len(), 1, "second insert appends");

        let out = write_docx(&bytes, &plan).unwrap();
        let filled = read_docx(&out).unwrap();
        let table = &filled.tables[0];
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0].cells[0].text(), "Qualification");
        assert_eq!(table.rows[1].cells[0].text(), "Cert III");
        assert_eq!(table.rows[1].cells[3].text(), "E123456");
        assert_eq!(table.rows[2].cells[1].text(), "2021");
    }

    #[test]
    fn test_excess_values_ignored_and_short_rows_padded() {
        let bytes = blank_template();
        let doc = read_docx(&bytes).unwrap();
        let mut filler = DocxFiller::new(doc);
        let five: Vec<String> = ["a", "b", "c", "d", "extra"].map(String::from).to_vec();
        filler.insert_row(0, &five);
        let plan = filler.into_plan();
        assert_eq!(plan.cell_writes.len(), 4, "fifth value has no column");
    }

    #[test]
    fn test_append_fallback_table() {
        let doc = DocxDocument {
            paragraphs: vec!["no tables here".into()],
            tables: vec![],
        };
        let bytes = build_docx(&doc).unwrap();

        let mut filler = DocxFiller::new(read_docx(&bytes).unwrap());
        let idx = filler.append_table(&["Qualification", "Year", "Statement", "Evidence"]);
        filler.insert_row(idx, &["Cert".into(), "2020".into(), "s".into(), "E1".into()]);

        let out = write_docx(&bytes, &filler.into_plan()).unwrap();
        let filled = read_docx(&out).unwrap();
        assert_eq!(filled.tables.len(), 1);
        assert_eq!(filled.tables[0].rows.len(), 2);
        assert_eq!(filled.tables[0].rows[0].cells[0].text(), "Qualification");
        assert_eq!(filled.tables[0].rows[1].cells[0].text(), "Cert");
    }

    #[test]
    fn test_untouched_parts_survive_rewrite() {
        let bytes = blank_template();
        let doc = read_docx(&bytes).unwrap();
        let mut filler = DocxFiller::new(doc);
        filler.insert_row(0, &["x".into(), "y".into(), "z".into(), "w".into()]);
        let out = write_docx(&bytes, &filler.into_plan()).unwrap();

        let filled = read_docx(&out).unwrap();
        assert_eq!(filled.paragraphs[0], "VCMT template");
        assert_eq!(filled.tables[0].header_cells()[0], "Qualification");
    }
}
