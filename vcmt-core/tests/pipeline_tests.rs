//! End-to-end pipeline tests over synthesized templates.
//!
//! Every test builds a small DOCX package in memory, runs the real
//! load → extract → fill → export path, and re-parses the produced bytes.
//! No fixtures on disk: the package builder and the reader are the same
//! code the pipeline itself uses, so a drift in either side fails here.

use vcmt_core::compose::TRANSITION_PHRASE;
use vcmt_core::docx::{build_docx, read_docx, DocxDocument, DocxRow, DocxTable};
use vcmt_core::{
    Entry, EntryKind, ExtractionConfig, PartRole, Session, VcmtProcessor,
};

// ============================================================================
// Template builders
// ============================================================================

fn blank_row(cols: usize) -> DocxRow {
    let no_values: [String; 0] = [];
    DocxRow::from_values(&no_values, cols)
}

fn header_row(cells: &[&str]) -> DocxRow {
    let values: Vec<String> = cells.iter().map(|c| c.to_string()).collect();
    DocxRow::from_values(&values, values.len())
}

/// A template with one unit description and one Part 1 destination table
/// holding a single blank data row.
fn template_doc() -> DocxDocument {
    DocxDocument {
        paragraphs: vec![
            "Unit Code: BSBWHS311 - Assist with maintaining workplace safety".to_string(),
            "Application Statement".to_string(),
            "This unit describes the skills and knowledge required to assist with workplace safety procedures.".to_string(),
            "Performance Criteria".to_string(),
            "• operate machinery in line with site procedures".to_string(),
            "• report safety incidents to the supervisor".to_string(),
            "• maintain safety documentation and records".to_string(),
        ],
        tables: vec![DocxTable {
            rows: vec![
                header_row(&["Qualification", "Year", "Statement", "Evidence"]),
                blank_row(4),
            ],
        }],
    }
}

fn template_bytes() -> Vec<u8> {
    build_docx(&template_doc()).unwrap()
}

fn qualification_entry(name: &str, year: &str, evidence_id: &str) -> Entry {
    let mut entry = Entry::new(EntryKind::Qualification {
        name: name.to_string(),
        year: year.to_string(),
    });
    entry.evidence_id = evidence_id.to_string();
    entry
}

// ============================================================================
// Read side: inspection and extraction
// ============================================================================

mod inspection {
    use super::*;

    #[test]
    fn detects_units_tables_and_mapping() {
        let processor = VcmtProcessor::with_defaults();
        let inspection = processor.inspect(&template_bytes()).unwrap();

        assert_eq!(inspection.tables.len(), 1);
        assert_eq!(inspection.tables[0].cols, 4);
        assert_eq!(inspection.mapping.qualification, Some(0));
        assert_eq!(inspection.mapping.experience, None);

        assert_eq!(inspection.units.len(), 1);
        let unit = &inspection.units[0];
        assert_eq!(unit.code, "BSBWHS311");
        assert_eq!(unit.name, "Assist with maintaining workplace safety");
        assert!(unit.application_statement.contains("workplace safety procedures"));
        assert_eq!(unit.performance_criteria.len(), 3);
    }

    #[test]
    fn session_load_matches_inspection() {
        let session = Session::load(template_bytes(), ExtractionConfig::default()).unwrap();
        assert_eq!(session.discovered_codes(), vec!["BSBWHS311"]);
        let selected = session.select_codes(&[], "bsbwhs311, UNKNOWN999");
        assert_eq!(selected, vec!["BSBWHS311"]);
    }
}

// ============================================================================
// Write side: filling, appending, fallback tables
// ============================================================================

mod filling {
    use super::*;

    #[test]
    fn fills_blank_row_and_preserves_header() {
        let mut session = Session::load(template_bytes(), ExtractionConfig::default()).unwrap();
        session.set_evidence_text("BSBWHS311", "operated heavy machinery on site daily");
        session.add_entry(
            "BSBWHS311",
            qualification_entry("Cert III in Work Health and Safety", "2019", "E123456"),
        );

        let processor = VcmtProcessor::with_defaults();
        let (bytes, report) = processor
            .export(&session, &["BSBWHS311".to_string()], None)
            .unwrap();

        assert_eq!(report.rows_written, 1);
        assert_eq!(report.rows_skipped, 0);
        assert_eq!(report.fallback_tables_created, 0);
        assert!(report.filename.starts_with("VCMT_BSBWHS311_"));
        assert!(report.filename.ends_with(".docx"));

        let out = read_docx(&bytes).unwrap();
        let table = &out.tables[0];
        assert_eq!(table.rows.len(), 2, "blank row reused, nothing appended");
        assert_eq!(
            table.header_cells(),
            vec!["Qualification", "Year", "Statement", "Evidence"]
        );

        let row = &table.rows[1];
        assert_eq!(row.cells[0].text(), "Cert III in Work Health and Safety");
        assert_eq!(row.cells[1].text(), "2019");
        assert_eq!(row.cells[3].text(), "E123456");

        let statement = row.cells[2].text();
        assert!(statement.contains("Within this qualification"));
        assert!(statement.contains(TRANSITION_PHRASE));
        assert!(statement.contains("operate machinery in line with site procedures"));
    }

    #[test]
    fn second_row_appends_when_no_blank_left() {
        let mut session = Session::load(template_bytes(), ExtractionConfig::default()).unwrap();
        session.add_entry("BSBWHS311", qualification_entry("Cert III", "2019", "E1"));
        session.add_entry("BSBWHS311", qualification_entry("Diploma", "2021", "E2"));

        let processor = VcmtProcessor::with_defaults();
        let (bytes, report) = processor
            .export(&session, &["BSBWHS311".to_string()], None)
            .unwrap();
        assert_eq!(report.rows_written, 2);

        let out = read_docx(&bytes).unwrap();
        let table = &out.tables[0];
        assert_eq!(table.rows.len(), 3, "one filled in place, one appended");
        assert_eq!(table.rows[1].cells[0].text(), "Cert III");
        assert_eq!(table.rows[2].cells[0].text(), "Diploma");
        assert_eq!(table.rows[2].cells.len(), 4);
    }

    #[test]
    fn incomplete_entry_is_skipped_not_written() {
        let mut session = Session::load(template_bytes(), ExtractionConfig::default()).unwrap();
        // Missing year: the row never becomes writable
        session.add_entry("BSBWHS311", qualification_entry("Cert III", "", "E1"));

        let processor = VcmtProcessor::with_defaults();
        let (bytes, report) = processor
            .export(&session, &["BSBWHS311".to_string()], None)
            .unwrap();
        assert_eq!(report.rows_written, 0);
        assert_eq!(report.rows_skipped, 1);

        let out = read_docx(&bytes).unwrap();
        assert!(out.tables[0].rows[1].is_blank(), "blank row stays blank");
    }

    #[test]
    fn invalid_year_blocks_row_from_export() {
        let mut session = Session::load(template_bytes(), ExtractionConfig::default()).unwrap();
        // Complete in every column, but "99" is not a valid year
        let mut entry = qualification_entry("Cert III", "99", "E123456");
        entry.statement = "Narrative.".to_string();
        session.add_entry("BSBWHS311", entry);

        let report = session.qa_report();
        assert!(report[0].is_blocked());

        let processor = VcmtProcessor::with_defaults();
        let (bytes, report) = processor
            .export(&session, &["BSBWHS311".to_string()], None)
            .unwrap();
        assert_eq!(report.rows_written, 0);
        assert_eq!(report.rows_skipped, 1);

        let out = read_docx(&bytes).unwrap();
        assert!(out.tables[0].rows[1].is_blank(), "blocked row never reaches the table");
    }

    #[test]
    fn fallback_table_created_for_unmapped_role() {
        let mut session = Session::load(template_bytes(), ExtractionConfig::default()).unwrap();
        let mut entry = Entry::new(EntryKind::Experience {
            role_title: "Site supervisor".to_string(),
            employer: "Acme Constructions".to_string(),
            years_worked: "2013-2018".to_string(),
        });
        entry.evidence_id = "E200".to_string();
        session.add_entry("BSBWHS311", entry);

        let processor = VcmtProcessor::with_defaults();
        let (bytes, report) = processor
            .export(&session, &["BSBWHS311".to_string()], None)
            .unwrap();
        assert_eq!(report.fallback_tables_created, 1);
        assert_eq!(report.rows_written, 1);
        assert_eq!(report.mapping.experience, Some(1));

        let out = read_docx(&bytes).unwrap();
        assert_eq!(out.tables.len(), 2);
        let fallback = &out.tables[1];
        assert_eq!(
            fallback.header_cells(),
            vec!["Industry / Community Experience", "Years", "Statement", "Evidence"]
        );
        assert_eq!(
            fallback.rows[1].cells[0].text(),
            "Site supervisor (Acme Constructions)"
        );
    }

    #[test]
    fn export_requires_codes() {
        let session = Session::load(template_bytes(), ExtractionConfig::default()).unwrap();
        let processor = VcmtProcessor::with_defaults();
        assert!(processor.export(&session, &[], None).is_err());
    }

    #[test]
    fn source_bytes_survive_repeated_exports() {
        let mut session = Session::load(template_bytes(), ExtractionConfig::default()).unwrap();
        session.add_entry("BSBWHS311", qualification_entry("Cert III", "2019", "E1"));
        let before = session.source().to_vec();

        let processor = VcmtProcessor::with_defaults();
        let (first, _) = processor
            .export(&session, &["BSBWHS311".to_string()], None)
            .unwrap();
        assert_eq!(session.source(), &before[..], "export never mutates the upload");

        // Second export starts from the same bytes and fills the same row
        let (second, report) = processor
            .export(&session, &["BSBWHS311".to_string()], None)
            .unwrap();
        assert_eq!(report.rows_written, 1);
        let first_doc = read_docx(&first).unwrap();
        let second_doc = read_docx(&second).unwrap();
        assert_eq!(
            first_doc.tables[0].rows.len(),
            second_doc.tables[0].rows.len()
        );
    }
}

// ============================================================================
// Statement composition through the whole path
// ============================================================================

mod composition {
    use super::*;

    #[test]
    fn prewritten_statement_is_kept_verbatim() {
        let mut session = Session::load(template_bytes(), ExtractionConfig::default()).unwrap();
        let mut entry = qualification_entry("Cert III", "2019", "E1");
        entry.statement = "Hand-written narrative.".to_string();
        session.add_entry("BSBWHS311", entry);

        let processor = VcmtProcessor::with_defaults();
        let (bytes, _) = processor
            .export(&session, &["BSBWHS311".to_string()], None)
            .unwrap();
        let out = read_docx(&bytes).unwrap();
        assert_eq!(out.tables[0].rows[1].cells[2].text(), "Hand-written narrative.");
    }

    #[test]
    fn no_evidence_still_yields_nonempty_statement() {
        let mut session = Session::load(template_bytes(), ExtractionConfig::default()).unwrap();
        session.add_entry("BSBWHS311", qualification_entry("Cert III", "2019", "E1"));

        let processor = VcmtProcessor::with_defaults();
        let (bytes, report) = processor
            .export(&session, &["BSBWHS311".to_string()], None)
            .unwrap();
        assert_eq!(report.rows_written, 1);

        let out = read_docx(&bytes).unwrap();
        let statement = out.tables[0].rows[1].cells[2].text();
        assert!(statement.contains(TRANSITION_PHRASE));
        assert!(!statement.trim().is_empty());
    }

    #[test]
    fn nameless_unit_leads_in_with_application_excerpt() {
        // No line near the code qualifies as a name, but the Application
        // Statement section is present
        let doc = DocxDocument {
            paragraphs: vec![
                "BSBWHS311".to_string(),
                "Form".to_string(),
                "Details".to_string(),
                "Version 2".to_string(),
                "Draft".to_string(),
                "Internal".to_string(),
                "Application Statement".to_string(),
                "This unit describes safe operation of machinery on site.".to_string(),
            ],
            tables: vec![DocxTable {
                rows: vec![
                    header_row(&["Qualification", "Year", "Statement", "Evidence"]),
                    blank_row(4),
                ],
            }],
        };
        let bytes = build_docx(&doc).unwrap();
        let mut session = Session::load(bytes, ExtractionConfig::default()).unwrap();
        assert_eq!(session.unit("BSBWHS311").unwrap().name, "");
        session.add_entry("BSBWHS311", qualification_entry("Cert III", "2019", "E1"));

        let processor = VcmtProcessor::with_defaults();
        let (bytes, _) = processor
            .export(&session, &["BSBWHS311".to_string()], None)
            .unwrap();
        let out = read_docx(&bytes).unwrap();
        let statement = out.tables[0].rows[1].cells[2].text();
        assert!(statement
            .contains("demonstrate competency in This unit describes safe operation of machinery"));
    }

    #[test]
    fn keyword_suggestions_come_from_unit_criteria() {
        let session = Session::load(template_bytes(), ExtractionConfig::default()).unwrap();
        let processor = VcmtProcessor::with_defaults();
        let suggestions = processor.suggest(
            &session,
            "BSBWHS311",
            &["machinery procedures".to_string()],
        );
        assert_eq!(
            suggestions,
            vec!["operate machinery in line with site procedures"]
        );
        assert!(processor.suggest(&session, "NOSUCH11", &["x".to_string()]).is_empty());
    }
}

// ============================================================================
// Part-role plumbing
// ============================================================================

mod roles {
    use super::*;

    #[test]
    fn mapping_override_redirects_rows() {
        let doc = DocxDocument {
            paragraphs: vec!["BSBWHS311 - Some Unit Name Here".to_string()],
            tables: vec![
                DocxTable {
                    rows: vec![
                        header_row(&["A", "B", "C", "D"]),
                        blank_row(4),
                    ],
                },
                DocxTable {
                    rows: vec![
                        header_row(&["E", "F", "G", "H"]),
                        blank_row(4),
                    ],
                },
            ],
        };
        let bytes = build_docx(&doc).unwrap();
        let mut session = Session::load(bytes, ExtractionConfig::default()).unwrap();
        session.add_entry("BSBWHS311", qualification_entry("Cert III", "2019", "E1"));

        // Heuristics would default table 0 to Qualification; the operator
        // points it at table 1 instead
        let mut mapping = vcmt_core::RoleMapping::default();
        mapping.set(PartRole::Qualification, 1);
        session.mapping_override = Some(mapping);

        let processor = VcmtProcessor::with_defaults();
        let (bytes, report) = processor
            .export(&session, &["BSBWHS311".to_string()], None)
            .unwrap();
        assert_eq!(report.mapping.qualification, Some(1));

        let out = read_docx(&bytes).unwrap();
        assert!(out.tables[0].rows[1].is_blank());
        assert_eq!(out.tables[1].rows[1].cells[0].text(), "Cert III");
    }
}
