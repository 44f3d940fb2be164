//! DOCX reading: ZIP container → `word/document.xml` → [`DocxDocument`].
//!
//! Pull-parses the WordprocessingML with quick-xml. Only `w:p`, `w:tbl`,
//! `w:tr`, `w:tc` and `w:t` matter; everything else (runs, properties,
//! section breaks) is skipped. Nested tables are not modeled as tables —
//! their text folds into the containing top-level cell, which is enough for
//! the extraction text stream.

use super::{DocxCell, DocxDocument, DocxError, DocxRow, DocxTable};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Load a DOCX byte stream into the document model.
pub fn read_docx(bytes: &[u8]) -> Result<DocxDocument, DocxError> {
    let xml = read_document_part(bytes)?;
    parse_document_xml(&xml)
}

pub(crate) fn read_document_part(bytes: &[u8]) -> Result<String, DocxError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut part = archive.by_name("word/document.xml")?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Parse the main document part into paragraphs and tables.
pub fn parse_document_xml(xml: &str) -> Result<DocxDocument, DocxError> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    let mut buf = Vec::new();

    let mut doc = DocxDocument::default();
    let mut table_depth = 0usize;
    let mut paragraph: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:tbl" => {
                    table_depth += 1;
                    if table_depth == 1 {
                        doc.tables.push(DocxTable::default());
                    }
                }
                b"w:tr" if table_depth == 1 => {
                    if let Some(table) = doc.tables.last_mut() {
                        table.rows.push(DocxRow::default());
                    }
                }
                b"w:tc" if table_depth == 1 => {
                    if let Some(row) = doc.tables.last_mut().and_then(|t| t.rows.last_mut()) {
                        row.cells.push(DocxCell::default());
                    }
                }
                b"w:p" => paragraph = Some(String::new()),
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:p" => finish_paragraph(&mut doc, table_depth, String::new()),
                // Tabs and line breaks inside a paragraph become a space so
                // that adjoining words don't fuse in the text stream
                b"w:tab" | b"w:br" | b"w:cr" => {
                    if let Some(p) = paragraph.as_mut() {
                        p.push(' ');
                    }
                }
                _ => {}
            },
            Event::Text(t) => {
                if in_text {
                    if let Some(p) = paragraph.as_mut() {
                        p.push_str(&t.unescape()?);
                    }
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                b"w:t" => in_text = false,
                b"w:p" => {
                    if let Some(text) = paragraph.take() {
                        finish_paragraph(&mut doc, table_depth, text);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(doc)
}

fn finish_paragraph(doc: &mut DocxDocument, table_depth: usize, text: String) {
    if table_depth >= 1 {
        // Paragraph inside a (possibly nested) table: attach to the current
        // cell of the current top-level table
        if let Some(cell) = doc
            .tables
            .last_mut()
            .and_then(|t| t.rows.last_mut())
            .and_then(|r| r.cells.last_mut())
        {
            cell.paragraphs.push(text);
            return;
        }
    }
    doc.paragraphs.push(text);
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Unit: </w:t></w:r><w:r><w:t>BSBWHS311 - Safety</w:t></w:r></w:p>
    <w:p/>
    <w:tbl>
      <w:tblPr/>
      <w:tr>
        <w:tc><w:p><w:r><w:t>Qualification</w:t></w:r></w:p></w:tc>
        <w:tc><w:p><w:r><w:t>Year</w:t></w:r></w:p></w:tc>
      </w:tr>
      <w:tr>
        <w:tc><w:p/></w:tc>
        <w:tc><w:p><w:r><w:t xml:space="preserve"> </w:t></w:r></w:p></w:tc>
      </w:tr>
    </w:tbl>
  </w:body>
</w:document>"#;

    #[test]
    fn test_parses_paragraphs_and_tables() {
        let doc = parse_document_xml(SAMPLE).unwrap();
        assert_eq!(doc.paragraphs[0], "Unit: BSBWHS311 - Safety");
        assert_eq!(doc.tables.len(), 1);
        let table = &doc.tables[0];
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.col_count(), 2);
        assert_eq!(table.header_cells(), vec!["Qualification", "Year"]);
        assert!(table.rows[1].is_blank());
        assert!(!table.rows[0].is_blank());
    }

    #[test]
    fn test_runs_within_paragraph_concatenate() {
        let doc = parse_document_xml(SAMPLE).unwrap();
        // Two w:r runs in the first paragraph join without separator
        assert!(doc.paragraphs[0].starts_with("Unit: BSBWHS311"));
    }

    #[test]
    fn test_nested_table_text_folds_into_cell() {
        let xml = r#"<w:document xmlns:w="x"><w:body>
          <w:tbl><w:tr><w:tc>
            <w:p><w:r><w:t>outer</w:t></w:r></w:p>
            <w:tbl><w:tr><w:tc><w:p><w:r><w:t>inner</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
          </w:tc></w:tr></w:tbl>
        </w:body></w:document>"#;
        let doc = parse_document_xml(xml).unwrap();
        assert_eq!(doc.tables.len(), 1);
        let cell = &doc.tables[0].rows[0].cells[0];
        assert_eq!(cell.paragraphs, vec!["outer", "inner"]);
    }
}
