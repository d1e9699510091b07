//! Dependency extraction from SQL text
//!
//! Dependencies are never declared explicitly: a unit depends on whatever CSV
//! files its SQL mentions. Extraction is a best-effort scan of the raw text,
//! so it also sees literals inside comments and strings.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Strategy turning SQL text into the set of unit names it references
pub trait DependencyExtractor {
    /// Extract referenced unit names; never fails
    fn extract(&self, sql: &str) -> BTreeSet<String>;
}

/// Finds quoted `.csv` literals, e.g. `'orders.csv'` or `"data/orders.csv"`
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvLiteralExtractor;

fn csv_literal() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"['"]([^'"]+)\.csv['"]"#).expect("CSV literal pattern is valid")
    })
}

impl CsvLiteralExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Strip directory components, keeping the file stem
    fn base_name(path: &str) -> &str {
        path.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(path)
    }
}

impl DependencyExtractor for CsvLiteralExtractor {
    fn extract(&self, sql: &str) -> BTreeSet<String> {
        csv_literal()
            .captures_iter(sql)
            .filter_map(|caps| caps.get(1))
            .map(|m| Self::base_name(m.as_str()))
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }
}
