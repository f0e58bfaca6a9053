use std::collections::HashMap;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::layout::{LayoutDocument, LayoutPage};
use crate::catalog::{DocumentOverride, known_title_pattern};

pub const UNKNOWN: &str = "Unknown";

const FIRST_PAGE_SCAN_BLOCKS: usize = 15;
const MIN_DOC_NAME_CHARS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardIdentity {
    pub standard_no: String,
    pub standard_name: String,
}

impl Default for StandardIdentity {
    fn default() -> Self {
        Self {
            standard_no: UNKNOWN.to_string(),
            standard_name: UNKNOWN.to_string(),
        }
    }
}

impl StandardIdentity {
    pub fn is_resolved(&self) -> bool {
        self.standard_no != UNKNOWN && self.standard_name != UNKNOWN
    }
}

#[derive(Debug, Clone)]
pub struct IdentityResolver {
    overrides: HashMap<String, DocumentOverride>,
    filename_number: Regex,
    standard_line: Regex,
    known_titles: Vec<Regex>,
}

impl IdentityResolver {
    pub fn new(overrides: Vec<DocumentOverride>, known_titles: &[String]) -> Result<Self> {
        Ok(Self {
            overrides: overrides
                .into_iter()
                .map(|entry| (entry.filename.clone(), entry))
                .collect(),
            filename_number: Regex::new(r"(?i)(?:^|[^a-z])(?:FAS|SS)[_\s-]?(\d+)")
                .context("failed to compile standard filename regex")?,
            standard_line: Regex::new(
                r"(?i)Financial Accounting Standard No\.\s*\((\w+)\)\s*:?\s*(.*)",
            )
            .context("failed to compile standard title line regex")?,
            known_titles: known_titles
                .iter()
                .map(|title| known_title_pattern(title))
                .collect::<Result<Vec<Regex>>>()?,
        })
    }

    /// Identity derivable without opening the document.
    pub fn identity_from_filename(&self, filename: &str) -> StandardIdentity {
        let mut identity = StandardIdentity::default();

        if let Some(number) = self
            .filename_number
            .captures(filename)
            .and_then(|captures| captures.get(1))
        {
            identity.standard_no = number.as_str().to_string();
        }

        if let Some(entry) = self.overrides.get(filename) {
            if let Some(standard_no) = entry
                .standard_no
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
            {
                identity.standard_no = standard_no.to_string();
            }
            identity.standard_name = entry.standard_name.clone();
        }

        identity
    }

    pub fn resolve(&self, filename: &str, document: &LayoutDocument) -> StandardIdentity {
        let mut identity = self.identity_from_filename(filename);
        if identity.standard_name != UNKNOWN {
            return identity;
        }

        info!(filename, "standard name not in override table; scanning first page");
        if let Some(first_page) = document.pages.first() {
            self.scan_first_page(first_page, filename, &mut identity);
        }

        if identity.standard_name == UNKNOWN {
            info!(filename, "standard name could not be determined from document content");
        }

        identity
    }

    fn scan_first_page(&self, page: &LayoutPage, filename: &str, identity: &mut StandardIdentity) {
        for block in page
            .blocks
            .iter()
            .take(FIRST_PAGE_SCAN_BLOCKS)
            .filter(|block| block.is_text())
        {
            let lines = block.text.trim().split('\n').collect::<Vec<&str>>();

            for (index, raw_line) in lines.iter().enumerate() {
                let line = raw_line.trim();

                if let Some(captures) = self.standard_line.captures(line) {
                    let doc_no = captures.get(1).map(|m| m.as_str().trim()).unwrap_or("");
                    if identity.standard_no == UNKNOWN {
                        identity.standard_no = doc_no.to_string();
                    } else if identity.standard_no != doc_no {
                        warn!(
                            filename,
                            filename_no = %identity.standard_no,
                            document_no = doc_no,
                            "standard number in filename differs from document; keeping filename value"
                        );
                    }

                    let name = captures.get(2).map(|m| m.as_str().trim()).unwrap_or("");
                    if name.chars().count() >= MIN_DOC_NAME_CHARS {
                        debug!(filename, standard_name = name, "standard name found on title line");
                        identity.standard_name = name.to_string();
                        return;
                    }
                }

                if let Some(title) = self.match_known_title(line) {
                    identity.standard_name = title.to_string();
                    return;
                }

                if let Some(title) = lines
                    .get(index + 1)
                    .and_then(|next| self.match_known_title(next.trim()))
                {
                    identity.standard_name = title.to_string();
                    return;
                }
            }
        }
    }

    fn match_known_title<'a>(&self, line: &'a str) -> Option<&'a str> {
        if line.is_empty() {
            return None;
        }

        self.known_titles
            .iter()
            .any(|pattern| pattern.is_match(line))
            .then_some(line)
    }
}
