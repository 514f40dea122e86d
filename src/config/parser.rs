//! Pest parser for the section/key=value config format

use std::collections::BTreeMap;

use pest::Parser;
use pest_derive::Parser;

use crate::error::{PwnboxError, Result};

#[derive(Parser)]
#[grammar = "../grammar/pwnbox.pest"]
pub struct ConfigParser;

/// A parsed config file: section name -> (upper-cased key -> trimmed value)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl Document {
    /// Look up a value. Keys are case-insensitive, section names are not.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|entries| entries.get(&key.to_ascii_uppercase()))
            .map(|v| v.as_str())
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(|s| s.as_str())
    }
}

/// Parse config file content into a [`Document`]
pub fn parse_document(input: &str) -> Result<Document> {
    let pairs = ConfigParser::parse(Rule::document, input)
        .map_err(|e| PwnboxError::ConfigError(format!("cannot parse config file:\n{}", e)))?;

    let document = pairs
        .into_iter()
        .next()
        .ok_or_else(|| PwnboxError::ConfigError("empty config file".to_string()))?;

    let mut doc = Document::default();
    let mut current: Option<String> = None;

    for entry in document.into_inner() {
        match entry.as_rule() {
            Rule::section => {
                let name = entry
                    .into_inner()
                    .next()
                    .map(|p| p.as_str().trim().to_string())
                    .unwrap_or_default();
                doc.sections.entry(name.clone()).or_default();
                current = Some(name);
            }
            Rule::pair => {
                let line = entry.line_col().0;
                let mut inner = entry.into_inner();
                let key = inner
                    .next()
                    .map(|p| p.as_str().to_ascii_uppercase())
                    .ok_or_else(|| {
                        PwnboxError::ConfigError(format!("line {}: expected a key", line))
                    })?;
                let value = inner
                    .next()
                    .map(|p| p.as_str().trim().to_string())
                    .unwrap_or_default();

                let section = current.as_ref().ok_or_else(|| {
                    PwnboxError::ConfigError(format!(
                        "line {}: key {} appears before any [SECTION] header",
                        line, key
                    ))
                })?;
                let entries = doc.sections.entry(section.clone()).or_default();
                if entries.contains_key(&key) {
                    return Err(PwnboxError::ConfigError(format!(
                        "line {}: duplicate key {} in section [{}]",
                        line, key, section
                    )));
                }
                entries.insert(key, value);
            }
            _ => {}
        }
    }

    Ok(doc)
}
