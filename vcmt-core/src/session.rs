//! Operator session state.
//!
//! One session per operator, single-threaded: every action recomputes from
//! the data held here. The uploaded bytes are kept alongside the parsed
//! browsing copy; the write path re-parses a fresh copy from the bytes so
//! repeated exports never corrupt the extraction baseline.

use crate::config::ExtractionConfig;
use crate::docx::{read_docx, DocxDocument};
use crate::normalize::{doc_text_lines, normalise_space};
use crate::rules::UnitExtractor;
use crate::types::{Entry, EntryId, EntryKind, PartRole, QaRow, RoleMapping, UnitRecord};
use crate::util::{mask_evidence_id, screen_free_text, PENDING_SENTINEL};
use anyhow::Result;
use std::collections::BTreeMap;

/// Result of feeding operator free text into the session.
#[derive(Debug, PartialEq, Eq)]
pub enum BlockOutcome {
    /// Number of items accepted
    Added(usize),
    /// The text matched an instruction-probing pattern; nothing was stored
    Refused(&'static str),
}

/// Everything tied to one unit: evidence rows per part, the free-text
/// evidence phrases fed to the matcher, and the operator's sign-off.
#[derive(Debug, Clone, Default)]
pub struct UnitData {
    pub entries: Vec<Entry>,
    pub evidence_text: Vec<String>,
    /// Operator has reviewed this unit's rows. Advisory: export proceeds
    /// either way, the caller decides whether to warn or gate on it.
    pub confirmed: bool,
}

pub struct Session {
    source: Vec<u8>,
    doc: DocxDocument,
    config: ExtractionConfig,
    units: BTreeMap<String, UnitRecord>,
    data: BTreeMap<String, UnitData>,
    /// Operator-chosen role mapping, overriding the header heuristics
    pub mapping_override: Option<RoleMapping>,
}

impl Session {
    /// Parse the uploaded template and scan it for units. The only hard
    /// failure: an unreadable document ends the attempt, the operator must
    /// re-upload.
    pub fn load(source: Vec<u8>, config: ExtractionConfig) -> Result<Self> {
        let doc = read_docx(&source)?;
        let extractor = UnitExtractor::new(&config)?;
        let units = extractor
            .extract_units(&doc)
            .into_iter()
            .map(|u| (u.code.clone(), u))
            .collect();
        Ok(Self {
            source,
            doc,
            config,
            units,
            data: BTreeMap::new(),
            mapping_override: None,
        })
    }

    pub fn source(&self) -> &[u8] {
        &self.source
    }

    pub fn doc(&self) -> &DocxDocument {
        &self.doc
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn units(&self) -> &BTreeMap<String, UnitRecord> {
        &self.units
    }

    pub fn unit(&self, code: &str) -> Option<&UnitRecord> {
        self.units.get(code)
    }

    pub fn discovered_codes(&self) -> Vec<String> {
        self.units.keys().cloned().collect()
    }

    /// Merge chosen codes with manual comma-separated additions, uppercase
    /// everything, keep only codes that actually occur in the document text,
    /// preserving first-seen order.
    pub fn select_codes(&self, chosen: &[String], manual_csv: &str) -> Vec<String> {
        let mut combined: Vec<String> = chosen
            .iter()
            .map(|c| normalise_space(c).to_uppercase())
            .collect();
        combined.extend(
            manual_csv
                .split(',')
                .map(|c| normalise_space(c).to_uppercase())
                .filter(|c| !c.is_empty()),
        );

        let full_text = doc_text_lines(&self.doc).join("\n").to_uppercase();
        let mut seen = std::collections::HashSet::new();
        combined
            .into_iter()
            .filter(|c| !c.is_empty() && full_text.contains(c.as_str()))
            .filter(|c| seen.insert(c.clone()))
            .collect()
    }

    pub fn unit_data(&self, code: &str) -> Option<&UnitData> {
        self.data.get(code)
    }

    pub fn add_entry(&mut self, code: &str, entry: Entry) -> EntryId {
        let id = entry.id;
        self.data.entry(code.to_string()).or_default().entries.push(entry);
        id
    }

    /// Mutable access for in-place edits of an existing row.
    pub fn entry_mut(&mut self, code: &str, id: EntryId) -> Option<&mut Entry> {
        self.data
            .get_mut(code)?
            .entries
            .iter_mut()
            .find(|e| e.id == id)
    }

    /// Parse a multi-line free-text block into one entry per non-blank line
    /// (the line becomes the title, everything else left for later edits).
    pub fn add_block(&mut self, code: &str, role: PartRole, block: &str) -> BlockOutcome {
        if let Some(refusal) = screen_free_text(block) {
            return BlockOutcome::Refused(refusal);
        }
        let mut added = 0;
        for line in block.lines() {
            let title = normalise_space(line);
            if title.is_empty() {
                continue;
            }
            let kind = match role {
                PartRole::Qualification => EntryKind::Qualification {
                    name: title,
                    year: String::new(),
                },
                PartRole::Experience => EntryKind::Experience {
                    role_title: title,
                    employer: String::new(),
                    years_worked: String::new(),
                },
                PartRole::ProfessionalDevelopment => EntryKind::ProfessionalDevelopment {
                    title,
                    year: String::new(),
                },
            };
            self.add_entry(code, Entry::new(kind));
            added += 1;
        }
        BlockOutcome::Added(added)
    }

    /// Store free-text evidence phrases for the matcher, one per non-blank
    /// line.
    pub fn set_evidence_text(&mut self, code: &str, block: &str) -> BlockOutcome {
        if let Some(refusal) = screen_free_text(block) {
            return BlockOutcome::Refused(refusal);
        }
        let phrases: Vec<String> = block
            .lines()
            .map(normalise_space)
            .filter(|l| !l.is_empty())
            .collect();
        let added = phrases.len();
        self.data.entry(code.to_string()).or_default().evidence_text = phrases;
        BlockOutcome::Added(added)
    }

    pub fn confirm_unit(&mut self, code: &str, confirmed: bool) {
        self.data.entry(code.to_string()).or_default().confirmed = confirmed;
    }

    /// Codes among `codes` that hold entries the operator has not signed off.
    pub fn unconfirmed(&self, codes: &[String]) -> Vec<String> {
        codes
            .iter()
            .filter(|code| {
                self.data
                    .get(code.as_str())
                    .map(|d| !d.entries.is_empty() && !d.confirmed)
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// Whole-unit reset: entries are never deleted individually. Clears the
    /// confirmation too.
    pub fn reset_unit(&mut self, code: &str) {
        self.data.remove(code);
    }

    /// Advisory validation for every entry. Blocked rows (missing title,
    /// invalid year) are excluded from writing; pending evidence is flagged
    /// but does not block.
    pub fn qa_report(&self) -> Vec<QaRow> {
        let mut rows = Vec::new();
        for (code, data) in &self.data {
            for entry in &data.entries {
                let pending = entry.evidence_id.trim().is_empty()
                    || entry.evidence_id.trim().eq_ignore_ascii_case(PENDING_SENTINEL);
                rows.push(QaRow {
                    unit_code: code.clone(),
                    part: entry.role(),
                    label: format!(
                        "{} | {} | Evidence: {}",
                        entry.title(),
                        entry.temporal(),
                        mask_evidence_id(&entry.evidence_id)
                    ),
                    missing_title: entry.missing_title(),
                    invalid_year: entry.invalid_year(),
                    pending_evidence: pending,
                });
            }
        }
        rows
    }
}
