//! Entries-file support for the CLI.
//!
//! The interactive flow of the pipeline is driven here by a YAML (or JSON)
//! file: one block per unit code carrying the operator's qualifications,
//! experience, professional development, and free-text evidence phrases.

use anyhow::{Context, Result};
use serde::Deserialize;
use vcmt_core::session::BlockOutcome;
use vcmt_core::{Entry, EntryKind, Session};

/// Top-level entries file.
#[derive(Debug, Deserialize)]
pub struct EntriesFile {
    /// Optional surname appended to the export filename
    #[serde(default)]
    pub surname: Option<String>,
    pub units: Vec<UnitEntriesSpec>,
}

#[derive(Debug, Deserialize)]
pub struct UnitEntriesSpec {
    pub code: String,
    /// Operator sign-off; set false to mark a unit as a draft
    #[serde(default = "default_confirmed")]
    pub confirmed: bool,
    /// Free-text evidence phrases fed to the criteria matcher
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default)]
    pub qualifications: Vec<QualificationSpec>,
    #[serde(default)]
    pub experience: Vec<ExperienceSpec>,
    #[serde(default)]
    pub professional_development: Vec<ProfessionalSpec>,
}

fn default_confirmed() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct QualificationSpec {
    pub name: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub evidence_id: String,
    /// Pre-written statement; left empty to have one composed at export
    #[serde(default)]
    pub statement: String,
}

#[derive(Debug, Deserialize)]
pub struct ExperienceSpec {
    pub role_title: String,
    #[serde(default)]
    pub employer: String,
    #[serde(default)]
    pub years_worked: String,
    #[serde(default)]
    pub evidence_id: String,
    #[serde(default)]
    pub statement: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfessionalSpec {
    pub title: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub evidence_id: String,
    #[serde(default)]
    pub statement: String,
}

impl EntriesFile {
    /// Parse an entries file. YAML is a superset of JSON, so both work.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read entries file: {path}"))?;
        let file: EntriesFile = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse entries file: {path}"))?;
        Ok(file)
    }

    /// Unit codes named by the file, in file order.
    pub fn codes(&self) -> Vec<String> {
        self.units.iter().map(|u| u.code.clone()).collect()
    }

    /// Load every entry into the session. Returns warnings for content the
    /// session refused; those units keep whatever was accepted before the
    /// refusal.
    pub fn apply(&self, session: &mut Session) -> Result<Vec<String>> {
        let mut warnings = Vec::new();

        for unit in &self.units {
            let code = unit.code.trim().to_uppercase();

            if !unit.evidence.is_empty() {
                let block = unit.evidence.join("\n");
                if let BlockOutcome::Refused(reason) = session.set_evidence_text(&code, &block) {
                    warnings.push(format!("{code}: evidence text refused ({reason})"));
                }
            }

            for q in &unit.qualifications {
                let mut entry = Entry::new(EntryKind::Qualification {
                    name: q.name.clone(),
                    year: q.year.clone(),
                });
                entry.evidence_id = q.evidence_id.clone();
                entry.statement = q.statement.clone();
                session.add_entry(&code, entry);
            }

            for e in &unit.experience {
                let mut entry = Entry::new(EntryKind::Experience {
                    role_title: e.role_title.clone(),
                    employer: e.employer.clone(),
                    years_worked: e.years_worked.clone(),
                });
                entry.evidence_id = e.evidence_id.clone();
                entry.statement = e.statement.clone();
                session.add_entry(&code, entry);
            }

            for p in &unit.professional_development {
                let mut entry = Entry::new(EntryKind::ProfessionalDevelopment {
                    title: p.title.clone(),
                    year: p.year.clone(),
                });
                entry.evidence_id = p.evidence_id.clone();
                entry.statement = p.statement.clone();
                session.add_entry(&code, entry);
            }

            session.confirm_unit(&code, unit.confirmed);
        }

        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_YAML: &str = r#"
surname: Nguyen
units:
  - code: bsbwhs311
    evidence:
      - operated machinery on site
      - prepared incident reports
    qualifications:
      - name: Cert III in Work Health and Safety
        year: "2019"
        evidence_id: E123456
    experience:
      - role_title: Site supervisor
        employer: Acme Constructions
        years_worked: 2013-2018
        evidence_id: E200
"#;

    #[test]
    fn test_parse_yaml() {
        let file: EntriesFile = serde_yaml::from_str(SAMPLE_YAML).unwrap();
        assert_eq!(file.surname.as_deref(), Some("Nguyen"));
        assert_eq!(file.codes(), vec!["bsbwhs311"]);
        assert_eq!(file.units[0].evidence.len(), 2);
        assert_eq!(file.units[0].qualifications[0].year, "2019");
        // defaults fill omitted fields
        assert_eq!(file.units[0].qualifications[0].statement, "");
        assert!(file.units[0].professional_development.is_empty());
        assert!(file.units[0].confirmed, "sign-off defaults to true");
    }

    #[test]
    fn test_draft_unit_parses() {
        let yaml = "units:\n  - code: BSBWHS311\n    confirmed: false\n";
        let file: EntriesFile = serde_yaml::from_str(yaml).unwrap();
        assert!(!file.units[0].confirmed);
    }

    #[test]
    fn test_parse_json_works_too() {
        let json = r#"{"units": [{"code": "BSBWHS311"}]}"#;
        let file: EntriesFile = serde_yaml::from_str(json).unwrap();
        assert_eq!(file.codes(), vec!["BSBWHS311"]);
        assert!(file.surname.is_none());
    }
}
