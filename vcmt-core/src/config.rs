use anyhow::Result;
use serde::{Deserialize, Serialize};

// Default value functions for serde
fn default_code_pattern() -> String {
    // 3+ uppercase letters followed by 2+ uppercase letters or digits
    r"\b[A-Z]{3,}[A-Z0-9]{2,}\b".to_string()
}

fn default_name_scan_window() -> usize {
    5 // Lines to scan forward for a name when the code line has no tail
}

fn default_min_name_words() -> usize {
    3
}

fn default_window_before() -> usize {
    5 // Lines kept before the code's first occurrence
}

fn default_window_after() -> usize {
    80 // Lines kept after the code's first occurrence
}

fn default_max_section_items() -> usize {
    12
}

fn default_min_content_words() -> usize {
    4 // "more than 3 words" qualifies an unmarked line as section content
}

fn default_bullet_markers() -> Vec<String> {
    vec!["•".to_string(), "-".to_string(), "*".to_string()]
}

fn default_section_headings() -> Vec<String> {
    vec![
        "Application Statement".to_string(),
        "Performance Evidence".to_string(),
        "Performance Criteria".to_string(),
    ]
}

fn default_field_labels() -> Vec<String> {
    vec!["Unit Code".to_string(), "Unit Name".to_string()]
}

fn default_max_matches() -> usize {
    7
}

fn default_max_suggestions() -> usize {
    4
}

fn default_min_destination_columns() -> usize {
    4
}

/// All tunable thresholds of the extraction/matching pipeline. The numeric
/// values are heuristic knobs, not semantics — loading a YAML file overrides
/// any subset of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Regex for candidate unit codes
    #[serde(default = "default_code_pattern")]
    pub code_pattern: String,

    /// How many lines past the code line to scan for a fallback name
    #[serde(default = "default_name_scan_window")]
    pub name_scan_window: usize,

    /// Minimum word count for a line to qualify as a fallback name
    #[serde(default = "default_min_name_words")]
    pub min_name_words: usize,

    /// Section window: lines kept before the code's first occurrence
    #[serde(default = "default_window_before")]
    pub window_before: usize,

    /// Section window: lines kept after the code's first occurrence
    #[serde(default = "default_window_after")]
    pub window_after: usize,

    /// Cap on collected Performance Evidence / Performance Criteria items
    #[serde(default = "default_max_section_items")]
    pub max_section_items: usize,

    /// Minimum word count for an unmarked line to count as section content
    #[serde(default = "default_min_content_words")]
    pub min_content_words: usize,

    /// Bullet markers recognized (and stripped) in section content
    #[serde(default = "default_bullet_markers")]
    pub bullet_markers: Vec<String>,

    /// Recognized section headings (matched case-insensitively, anchored at
    /// line start)
    #[serde(default = "default_section_headings")]
    pub section_headings: Vec<String>,

    /// Field-label lines that never qualify as a unit name
    #[serde(default = "default_field_labels")]
    pub field_labels: Vec<String>,

    /// Minimum column count for a table to qualify as a destination
    #[serde(default = "default_min_destination_columns")]
    pub min_destination_columns: usize,

    /// Evidence matcher configuration
    #[serde(default)]
    pub matcher: MatcherConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Maximum matched criteria returned per unit
    #[serde(default = "default_max_matches")]
    pub max_matches: usize,

    /// Maximum keyword-driven suggestions returned
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            max_matches: default_max_matches(),
            max_suggestions: default_max_suggestions(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            code_pattern: default_code_pattern(),
            name_scan_window: default_name_scan_window(),
            min_name_words: default_min_name_words(),
            window_before: default_window_before(),
            window_after: default_window_after(),
            max_section_items: default_max_section_items(),
            min_content_words: default_min_content_words(),
            bullet_markers: default_bullet_markers(),
            section_headings: default_section_headings(),
            field_labels: default_field_labels(),
            min_destination_columns: default_min_destination_columns(),
            matcher: MatcherConfig::default(),
        }
    }
}

impl ExtractionConfig {
    /// Load config from file path (functional approach)
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ExtractionConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|_| {
                eprintln!("⚠️  Failed to load config from {}, using defaults", p);
                Self::default()
            }),
            None => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: ExtractionConfig = serde_yaml::from_str("window_after: 40\n").unwrap();
        assert_eq!(config.window_after, 40);
        assert_eq!(config.window_before, 5);
        assert_eq!(config.max_section_items, 12);
        assert_eq!(config.matcher.max_matches, 7);
    }

    #[test]
    fn test_load_with_fallback_on_missing_file() {
        let config = ExtractionConfig::load_with_fallback(Some("/nonexistent/vcmt.yaml"));
        assert_eq!(config.min_destination_columns, 4);
    }
}
