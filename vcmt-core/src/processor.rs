//! End-to-end pipeline orchestration.
//!
//! `inspect` runs the read-only half (tables, role mapping, unit extraction);
//! `export` runs the write half against a fresh parse of the uploaded bytes,
//! composing missing statements on the way and reporting exactly what was
//! written, skipped, and created.

use crate::compose::{
    application_excerpt, compose_for_unit, compose_statement, lead_in_from_application,
};
use crate::config::ExtractionConfig;
use crate::docx::{read_docx, write_docx, DocxFiller};
use crate::matcher::{match_evidence, suggest_from_keywords};
use crate::rules::{list_tables, locate_part_tables, UnitExtractor};
use crate::session::Session;
use crate::types::{Entry, FillReport, Inspection, PartRole, UnitRecord};
use anyhow::{bail, Result};
use chrono::{Local, Utc};

pub struct VcmtProcessor {
    config: ExtractionConfig,
}

impl VcmtProcessor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(ExtractionConfig::default())
    }

    /// Read-only template survey: every table, the inferred role mapping,
    /// and the units the heuristics could find.
    pub fn inspect(&self, bytes: &[u8]) -> Result<Inspection> {
        let doc = read_docx(bytes)?;
        let tables = list_tables(&doc);
        let mapping = locate_part_tables(&doc, &self.config);
        let extractor = UnitExtractor::new(&self.config)?;
        let units = extractor.extract_units(&doc);
        Ok(Inspection {
            tables,
            mapping,
            units,
        })
    }

    /// Keyword-driven criterion suggestions for one unit, bulletized.
    pub fn suggest(&self, session: &Session, code: &str, seeds: &[String]) -> Vec<String> {
        let Some(unit) = session.unit(code) else {
            return Vec::new();
        };
        suggest_from_keywords(
            seeds,
            &unit.performance_criteria,
            self.config.matcher.max_suggestions,
        )
    }

    /// Fill the template with every writable entry of the selected codes and
    /// return the new package bytes plus a report of what happened.
    ///
    /// The uploaded bytes are re-parsed here so repeated exports and earlier
    /// inspection never interfere. Entries without a statement get one
    /// composed from matched performance criteria before the writability
    /// check.
    pub fn export(
        &self,
        session: &Session,
        codes: &[String],
        surname: Option<&str>,
    ) -> Result<(Vec<u8>, FillReport)> {
        if codes.is_empty() {
            bail!("no unit codes selected for export");
        }

        println!("📄 Parsing a fresh copy of the template...");
        let doc = read_docx(session.source())?;
        let mut mapping = session
            .mapping_override
            .unwrap_or_else(|| locate_part_tables(&doc, &self.config));

        let mut filler = DocxFiller::new(doc);
        let mut fallback_tables_created = 0;

        // Roles that hold entries but have no destination table get one
        // appended at the end of the body
        for role in PartRole::ALL {
            let has_entries = codes.iter().any(|code| {
                session
                    .unit_data(code)
                    .map(|d| d.entries.iter().any(|e| e.role() == role))
                    .unwrap_or(false)
            });
            if has_entries && mapping.get(role).is_none() {
                println!("➕ No destination table for {}, appending one", role.label());
                let idx = filler.append_table(&role.fallback_header());
                mapping.set(role, idx);
                fallback_tables_created += 1;
            }
        }

        let mut rows_written = 0;
        let mut rows_skipped = 0;

        for code in codes {
            let Some(data) = session.unit_data(code) else {
                continue;
            };
            let fallback_unit = UnitRecord::new(code);
            let unit = session.unit(code).unwrap_or(&fallback_unit);

            for role in PartRole::ALL {
                let Some(table_idx) = mapping.get(role) else {
                    continue;
                };
                for entry in data.entries.iter().filter(|e| e.role() == role) {
                    // Validation failures block the row regardless of how
                    // complete it otherwise is
                    if entry.is_blocked() {
                        rows_skipped += 1;
                        continue;
                    }
                    let entry = self.with_statement(entry, role, unit, &data.evidence_text);
                    if entry.is_writable() {
                        filler.insert_row(table_idx, &entry.row_values());
                        rows_written += 1;
                    } else {
                        rows_skipped += 1;
                    }
                }
            }
        }

        println!(
            "✍️  Writing {} rows ({} skipped as incomplete)...",
            rows_written, rows_skipped
        );
        let bytes = write_docx(session.source(), &filler.into_plan())?;

        let report = FillReport {
            generated_at: Utc::now(),
            filename: export_filename(codes, surname),
            codes: codes.to_vec(),
            mapping,
            rows_written,
            rows_skipped,
            fallback_tables_created,
        };
        println!("✅ Export complete: {}", report.filename);
        Ok((bytes, report))
    }

    /// Clone the entry, composing a statement from matched criteria when it
    /// has none. A unit with no resolvable name but a known application
    /// statement leads in with an excerpt of that statement instead of the
    /// bare code.
    fn with_statement(
        &self,
        entry: &Entry,
        role: PartRole,
        unit: &UnitRecord,
        evidence_text: &[String],
    ) -> Entry {
        let mut entry = entry.clone();
        if entry.statement.trim().is_empty() {
            let bullets = match_evidence(
                &unit.performance_criteria,
                evidence_text,
                self.config.matcher.max_matches,
            );
            entry.statement = if unit.name.is_empty() && !unit.application_statement.is_empty() {
                let excerpt = application_excerpt(&unit.application_statement, 12);
                compose_statement(&lead_in_from_application(role, &excerpt), &bullets)
            } else {
                compose_for_unit(role, unit, &bullets)
            };
        }
        entry
    }
}

/// `VCMT_<CODE1>_<CODE2>[_<SURNAME>]_<YYYYMMDD>.docx`
fn export_filename(codes: &[String], surname: Option<&str>) -> String {
    let mut parts = vec!["VCMT".to_string()];
    parts.extend(codes.iter().cloned());
    if let Some(surname) = surname {
        let surname = surname.trim();
        if !surname.is_empty() {
            parts.push(surname.to_string());
        }
    }
    parts.push(Local::now().format("%Y%m%d").to_string());
    format!("{}.docx", parts.join("_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_filename_shape() {
        let codes = vec!["BSBWHS311".to_string(), "CPCCOM1012".to_string()];
        let name = export_filename(&codes, None);
        let stamp = Local::now().format("%Y%m%d").to_string();
        assert_eq!(name, format!("VCMT_BSBWHS311_CPCCOM1012_{stamp}.docx"));
    }

    #[test]
    fn test_export_filename_with_surname() {
        let codes = vec!["BSBWHS311".to_string()];
        let name = export_filename(&codes, Some("Nguyen"));
        let stamp = Local::now().format("%Y%m%d").to_string();
        assert_eq!(name, format!("VCMT_BSBWHS311_Nguyen_{stamp}.docx"));
        // blank surname is dropped, not serialized as an empty segment
        let name = export_filename(&codes, Some("  "));
        assert_eq!(name, format!("VCMT_BSBWHS311_{stamp}.docx"));
    }
}
