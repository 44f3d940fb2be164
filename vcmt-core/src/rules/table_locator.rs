//! Destination table classification.
//!
//! A table qualifies as a destination candidate only when it has at least
//! four columns. Role assignment is keyword matching over the normalized
//! header row, first match wins per role; when no header carries a keyword
//! the first unclaimed eligible table defaults to the Qualification role.
//! "No eligible table at all" is a distinct condition the caller resolves
//! by operator override or by appending a fallback table.

use crate::config::ExtractionConfig;
use crate::docx::DocxDocument;
use crate::types::{RoleMapping, TableInfo};

const QUALIFICATION_KEYWORDS: [&str; 2] = ["qualification", "units of competency"];
const EXPERIENCE_KEYWORDS: [&str; 2] = ["industry", "community experience"];
const PROFESSIONAL_KEYWORDS: [&str; 1] = ["professional development"];

/// Row/column counts and header text for every table, in document order.
pub fn list_tables(doc: &DocxDocument) -> Vec<TableInfo> {
    doc.tables
        .iter()
        .enumerate()
        .map(|(index, table)| TableInfo {
            index,
            rows: table.rows.len(),
            cols: table.col_count(),
            header: table.header_cells(),
        })
        .collect()
}

/// Indexes of tables wide enough to be destinations.
pub fn eligible_tables(doc: &DocxDocument, config: &ExtractionConfig) -> Vec<usize> {
    doc.tables
        .iter()
        .enumerate()
        .filter(|(_, t)| t.col_count() >= config.min_destination_columns)
        .map(|(i, _)| i)
        .collect()
}

/// Assign destination roles to tables by header keywords.
pub fn locate_part_tables(doc: &DocxDocument, config: &ExtractionConfig) -> RoleMapping {
    let mut mapping = RoleMapping::default();

    for (index, table) in doc.tables.iter().enumerate() {
        if table.col_count() < config.min_destination_columns {
            continue;
        }
        let header = table.header_cells().join(" ").to_lowercase();

        if QUALIFICATION_KEYWORDS.iter().any(|k| header.contains(k)) {
            if mapping.qualification.is_none() {
                mapping.qualification = Some(index);
            }
        } else if EXPERIENCE_KEYWORDS.iter().any(|k| header.contains(k)) {
            if mapping.experience.is_none() {
                mapping.experience = Some(index);
            }
        } else if PROFESSIONAL_KEYWORDS.iter().any(|k| header.contains(k)) {
            if mapping.professional_development.is_none() {
                mapping.professional_development = Some(index);
            }
        }
    }

    // No keyword matched anywhere: the first unclaimed eligible table
    // defaults to the Qualification role
    if mapping.qualification.is_none() {
        let claimed = [mapping.experience, mapping.professional_development];
        if let Some(index) = eligible_tables(doc, config)
            .into_iter()
            .find(|i| !claimed.contains(&Some(*i)))
        {
            mapping.qualification = Some(index);
        }
    }

    mapping
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::{DocxDocument, DocxRow, DocxTable};

    fn table_with_header(cells: &[&str]) -> DocxTable {
        let values: Vec<String> = cells.iter().map(|c| c.to_string()).collect();
        DocxTable {
            rows: vec![DocxRow::from_values(&values, values.len())],
        }
    }

    fn doc_with(tables: Vec<DocxTable>) -> DocxDocument {
        DocxDocument { paragraphs: vec![], tables }
    }

    #[test]
    fn test_roles_by_header_keyword_first_match_wins() {
        let doc = doc_with(vec![
            table_with_header(&["Qualification", "Year", "Statement", "Evidence"]),
            table_with_header(&["Industry / Community Experience", "Years", "Statement", "Evidence"]),
            table_with_header(&["Professional Development", "Year", "Statement", "Evidence"]),
            table_with_header(&["Qualification", "Year", "Statement", "Evidence"]), // later duplicate ignored
        ]);
        let mapping = locate_part_tables(&doc, &ExtractionConfig::default());
        assert_eq!(mapping.qualification, Some(0));
        assert_eq!(mapping.experience, Some(1));
        assert_eq!(mapping.professional_development, Some(2));
    }

    #[test]
    fn test_narrow_tables_are_ineligible() {
        let doc = doc_with(vec![
            table_with_header(&["Qualification", "Year"]), // 2 cols
            table_with_header(&["Qualification", "Year", "Statement", "Evidence"]),
        ]);
        let config = ExtractionConfig::default();
        assert_eq!(eligible_tables(&doc, &config), vec![1]);
        let mapping = locate_part_tables(&doc, &config);
        assert_eq!(mapping.qualification, Some(1));
    }

    #[test]
    fn test_no_keywords_defaults_first_eligible_to_qualification() {
        let doc = doc_with(vec![table_with_header(&["A", "B", "C", "D"])]);
        let mapping = locate_part_tables(&doc, &ExtractionConfig::default());
        assert_eq!(mapping.qualification, Some(0));
        assert_eq!(mapping.experience, None);
    }

    #[test]
    fn test_no_eligible_table_reports_empty_mapping() {
        let doc = doc_with(vec![table_with_header(&["A", "B"])]);
        let mapping = locate_part_tables(&doc, &ExtractionConfig::default());
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_table_info_describe() {
        let doc = doc_with(vec![table_with_header(&["Qualification", "Year", "Statement", "Evidence"])]);
        let infos = list_tables(&doc);
        assert_eq!(
            infos[0].describe(),
            "Table 0: 1 rows x 4 cols | header: Qualification | Year | Statement | Evidence"
        );
    }
}
