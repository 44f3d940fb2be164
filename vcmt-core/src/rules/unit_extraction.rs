//! Unit code discovery plus name and section extraction.
//!
//! Codes are substrings matching "3+ uppercase letters then 2+ uppercase
//! letters or digits" anywhere in the flattened text. For each code the
//! extractor works off the first line containing it: the name comes from a
//! `CODE - tail` / `CODE : tail` match or a nearby wordy line, and the three
//! recognized sections are collected from a bounded window of lines around
//! that occurrence.
//!
//! These are good-enough heuristics for loosely formatted templates, not a
//! parser: a short non-heading line ends bullet collection early, and that
//! approximate behavior is intentional.

use crate::config::ExtractionConfig;
use crate::docx::DocxDocument;
use crate::normalize::{normalise_space, normalised_text_lines};
use crate::types::UnitRecord;
use anyhow::Result;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static NUMBERED_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(?\d+[.)]\s*").unwrap());

pub struct UnitExtractor {
    code_re: Regex,
    config: ExtractionConfig,
}

impl UnitExtractor {
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        Ok(Self {
            code_re: Regex::new(&config.code_pattern)?,
            config: config.clone(),
        })
    }

    /// Scan the whole document and build one record per discovered code,
    /// sorted by code.
    pub fn extract_units(&self, doc: &DocxDocument) -> Vec<UnitRecord> {
        let lines = normalised_text_lines(doc);
        self.extract_units_from_lines(&lines)
    }

    pub fn extract_units_from_lines(&self, lines: &[String]) -> Vec<UnitRecord> {
        let codes = self.discover_codes(lines);
        codes
            .iter()
            .map(|code| self.build_record(code, lines))
            .collect()
    }

    /// All code candidates in the text, deduplicated into a sorted set.
    pub fn discover_codes(&self, lines: &[String]) -> Vec<String> {
        let blob = lines.join("\n");
        let set: BTreeSet<String> = self
            .code_re
            .find_iter(&blob)
            .map(|m| m.as_str().to_string())
            .collect();
        set.into_iter().collect()
    }

    fn build_record(&self, code: &str, lines: &[String]) -> UnitRecord {
        let mut record = UnitRecord::new(code);

        // First-occurrence policy: later occurrences are ignored
        let Some(pos) = lines.iter().position(|l| l.contains(code)) else {
            return record;
        };

        record.name = self.resolve_name(code, pos, lines);
        self.extract_sections(&mut record, pos, lines);
        record
    }

    fn resolve_name(&self, code: &str, pos: usize, lines: &[String]) -> String {
        // (a) inline tail: "CODE - rest-of-line" or "CODE : rest-of-line".
        // Built once per code; a compile failure is just a heuristic miss
        // like any other, the scan below still runs.
        let tail_re = Regex::new(&format!(r"{}\s*[-–—:]\s*(.+)", regex::escape(code))).ok();
        if let Some(caps) = tail_re.and_then(|re| re.captures(&lines[pos])) {
            let tail = normalise_space(&caps[1]);
            if !tail.is_empty() {
                return tail;
            }
        }

        // (b) first wordy nearby line that is not a field label
        let end = (pos + 1 + self.config.name_scan_window).min(lines.len());
        for line in &lines[pos + 1..end] {
            if self.is_field_label(line) {
                continue;
            }
            if line.split_whitespace().count() >= self.config.min_name_words {
                return line.clone();
            }
        }

        // (c) no name found
        String::new()
    }

    fn is_field_label(&self, line: &str) -> bool {
        let lower = line.to_lowercase();
        self.config
            .field_labels
            .iter()
            .any(|label| lower.starts_with(&label.to_lowercase()))
    }

    fn extract_sections(&self, record: &mut UnitRecord, pos: usize, lines: &[String]) {
        let start = pos.saturating_sub(self.config.window_before);
        let end = (pos + self.config.window_after).min(lines.len());
        let window = &lines[start..end];

        let mut collected: Vec<Vec<String>> = vec![Vec::new(); self.config.section_headings.len()];
        let mut current: Option<usize> = None;

        for line in window {
            if let Some(heading) = self.match_heading(line) {
                current = Some(heading);
                continue;
            }
            let Some(section) = current else { continue };
            match self.content_of(line) {
                Some(content) => collected[section].push(content),
                // A line that is neither heading nor content ends the
                // section — approximate on purpose
                None => current = None,
            }
        }

        for (idx, heading) in self.config.section_headings.iter().enumerate() {
            let items = dedup_preserving_order(&collected[idx], self.config.max_section_items);
            match heading.to_lowercase().as_str() {
                "application statement" => record.application_statement = items.join(" "),
                "performance evidence" => record.performance_evidence = items,
                "performance criteria" => record.performance_criteria = items,
                _ => {}
            }
        }
    }

    /// Which recognized heading starts this line, if any. Case-insensitive,
    /// anchored at line start.
    fn match_heading(&self, line: &str) -> Option<usize> {
        let lower = line.to_lowercase();
        self.config
            .section_headings
            .iter()
            .position(|h| lower.starts_with(&h.to_lowercase()))
    }

    /// A content line starts with a bullet marker or a numbered-list prefix
    /// (marker stripped), or is a long plain sentence.
    fn content_of(&self, line: &str) -> Option<String> {
        for marker in &self.config.bullet_markers {
            if let Some(rest) = line.strip_prefix(marker.as_str()) {
                let rest = normalise_space(rest);
                if !rest.is_empty() {
                    return Some(rest);
                }
                return None;
            }
        }
        if let Some(m) = NUMBERED_PREFIX.find(line) {
            let rest = normalise_space(&line[m.end()..]);
            if !rest.is_empty() {
                return Some(rest);
            }
            return None;
        }
        if line.split_whitespace().count() >= self.config.min_content_words {
            return Some(line.to_string());
        }
        None
    }
}

fn dedup_preserving_order(items: &[String], max: usize) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for item in items {
        if out.len() >= max {
            break;
        }
        if seen.insert(item.clone()) {
            out.push(item.clone());
        }
    }
    out
}
