use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type EntryId = Uuid;

// ===== UNIT RECORDS =====

/// One detected competency code with whatever the extraction heuristics
/// could find near its first occurrence. Heuristic misses leave fields
/// empty — never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitRecord {
    /// Uppercase alphanumeric identifier, e.g. "BSBWHS311"
    pub code: String,
    /// Best-effort human-readable title
    pub name: String,
    /// Single descriptive paragraph from the "Application Statement" section
    pub application_statement: String,
    /// Distinct phrases under the "Performance Evidence" heading, in order
    pub performance_evidence: Vec<String>,
    /// Distinct phrases under the "Performance Criteria" heading, in order
    pub performance_criteria: Vec<String>,
}

impl UnitRecord {
    pub fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
            ..Default::default()
        }
    }

    /// Display name, falling back to the code when no name was found.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.code
        } else {
            &self.name
        }
    }
}

// ===== DESTINATION TABLE ROLES =====

/// The three destination table roles ("Part 1/2/3" in the template).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartRole {
    Qualification,
    Experience,
    ProfessionalDevelopment,
}

impl PartRole {
    pub const ALL: [PartRole; 3] = [
        PartRole::Qualification,
        PartRole::Experience,
        PartRole::ProfessionalDevelopment,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PartRole::Qualification => "Part 1 — Qualifications / Units of Competency",
            PartRole::Experience => "Part 2 — Industry / Community Experience",
            PartRole::ProfessionalDevelopment => "Part 3 — Professional Development",
        }
    }

    /// Header row used when a fallback destination table has to be created.
    pub fn fallback_header(&self) -> [&'static str; 4] {
        match self {
            PartRole::Qualification => ["Qualification", "Year", "Statement", "Evidence"],
            PartRole::Experience => {
                ["Industry / Community Experience", "Years", "Statement", "Evidence"]
            }
            PartRole::ProfessionalDevelopment => {
                ["Professional Development", "Year", "Statement", "Evidence"]
            }
        }
    }
}

/// Summary of one table in the loaded document, used for display and for
/// role classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInfo {
    pub index: usize,
    pub rows: usize,
    pub cols: usize,
    /// Normalized header-row cells (display truncates to the first 6)
    pub header: Vec<String>,
}

impl TableInfo {
    pub fn describe(&self) -> String {
        let header = if self.header.is_empty() {
            "(none)".to_string()
        } else {
            self.header
                .iter()
                .take(6)
                .cloned()
                .collect::<Vec<_>>()
                .join(" | ")
        };
        format!(
            "Table {}: {} rows x {} cols | header: {}",
            self.index, self.rows, self.cols, header
        )
    }
}

/// Role-to-table assignment. `None` means no qualifying table was found for
/// that role; the write path may then append a fallback table.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RoleMapping {
    pub qualification: Option<usize>,
    pub experience: Option<usize>,
    pub professional_development: Option<usize>,
}

impl RoleMapping {
    pub fn get(&self, role: PartRole) -> Option<usize> {
        match role {
            PartRole::Qualification => self.qualification,
            PartRole::Experience => self.experience,
            PartRole::ProfessionalDevelopment => self.professional_development,
        }
    }

    pub fn set(&mut self, role: PartRole, index: usize) {
        match role {
            PartRole::Qualification => self.qualification = Some(index),
            PartRole::Experience => self.experience = Some(index),
            PartRole::ProfessionalDevelopment => self.professional_development = Some(index),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.qualification.is_none()
            && self.experience.is_none()
            && self.professional_development.is_none()
    }
}

// ===== ENTRY RECORDS =====

/// Per-part payload of an operator-supplied evidence row. Fixed-shape
/// variants instead of free-form key/value rows so required fields are
/// checked at compile time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryKind {
    Qualification {
        name: String,
        year: String,
    },
    Experience {
        role_title: String,
        employer: String,
        years_worked: String,
    },
    ProfessionalDevelopment {
        title: String,
        year: String,
    },
}

/// One row of operator-supplied evidence tied to a unit. Mutated in place
/// as the operator edits; removed only by whole-unit reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub kind: EntryKind,
    /// Supporting-document reference, possibly the sentinel "Pending"
    pub evidence_id: String,
    /// Generated narrative; may be a bare-bullet placeholder but must be
    /// non-empty before the row is writable
    pub statement: String,
}

impl Entry {
    pub fn new(kind: EntryKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            evidence_id: String::new(),
            statement: String::new(),
        }
    }

    pub fn role(&self) -> PartRole {
        match self.kind {
            EntryKind::Qualification { .. } => PartRole::Qualification,
            EntryKind::Experience { .. } => PartRole::Experience,
            EntryKind::ProfessionalDevelopment { .. } => PartRole::ProfessionalDevelopment,
        }
    }

    /// Title shown in QA previews and written to the first column. An
    /// experience row folds the employer into the title.
    pub fn title(&self) -> String {
        match &self.kind {
            EntryKind::Qualification { name, .. } => name.clone(),
            EntryKind::Experience { role_title, employer, .. } => {
                if employer.is_empty() {
                    role_title.clone()
                } else {
                    format!("{role_title} ({employer})")
                }
            }
            EntryKind::ProfessionalDevelopment { title, .. } => title.clone(),
        }
    }

    /// The temporal column: a 4-digit year or a free-text duration.
    pub fn temporal(&self) -> &str {
        match &self.kind {
            EntryKind::Qualification { year, .. } => year,
            EntryKind::Experience { years_worked, .. } => years_worked,
            EntryKind::ProfessionalDevelopment { year, .. } => year,
        }
    }

    /// The four destination column values, in table order.
    pub fn row_values(&self) -> [String; 4] {
        [
            self.title(),
            self.temporal().to_string(),
            self.statement.clone(),
            self.evidence_id.clone(),
        ]
    }

    /// A row is only eligible for writing once every destination column is
    /// non-empty.
    pub fn is_writable(&self) -> bool {
        self.row_values().iter().all(|v| !v.trim().is_empty())
    }

    pub fn missing_title(&self) -> bool {
        self.title().trim().is_empty()
    }

    /// A non-empty year field that is not a valid 4-digit year. Experience
    /// durations are free text and never year-checked.
    pub fn invalid_year(&self) -> bool {
        if matches!(self.kind, EntryKind::Experience { .. }) {
            return false;
        }
        let temporal = self.temporal().trim();
        !temporal.is_empty() && !crate::util::validate_year(temporal)
    }

    /// A validation failure blocks every write for this row until the
    /// operator corrects it.
    pub fn is_blocked(&self) -> bool {
        self.missing_title() || self.invalid_year()
    }
}

// ===== QA & FILL REPORTING =====

/// One QA preview line for an entry: advisory validation only, write
/// actions for the row stay blocked until corrected.
#[derive(Debug, Clone, Serialize)]
pub struct QaRow {
    pub unit_code: String,
    pub part: PartRole,
    /// "title | temporal | Evidence: masked-id"
    pub label: String,
    pub missing_title: bool,
    pub invalid_year: bool,
    pub pending_evidence: bool,
}

impl QaRow {
    pub fn is_blocked(&self) -> bool {
        self.missing_title || self.invalid_year
    }
}

/// What the fill/export pass actually did.
#[derive(Debug, Clone, Serialize)]
pub struct FillReport {
    pub generated_at: DateTime<Utc>,
    pub filename: String,
    pub codes: Vec<String>,
    pub mapping: RoleMapping,
    pub rows_written: usize,
    pub rows_skipped: usize,
    pub fallback_tables_created: usize,
}

/// Result of inspecting a template without filling it.
#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
    pub tables: Vec<TableInfo>,
    pub mapping: RoleMapping,
    pub units: Vec<UnitRecord>,
}
