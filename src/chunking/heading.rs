use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::catalog::SectionMarker;

const MAX_TITLE_WORDS: usize = 20;
const MAX_L1_TITLE_WORDS: usize = 25;
const MIN_LIST_LIKE_HEADING_WORDS: usize = 5;
const HONORIFICS: [&str; 3] = ["Mr. ", "Ms. ", "Dr. "];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    #[serde(rename = "L1_NumDot")]
    L1Numbered,
    #[serde(rename = "L2_Slash")]
    L2Slash,
    #[serde(rename = "L3_SlashSlash")]
    L3DoubleSlash,
    #[serde(rename = "IN_Num")]
    InNumbered,
}

impl HeadingLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            HeadingLevel::L1Numbered => "L1_NumDot",
            HeadingLevel::L2Slash => "L2_Slash",
            HeadingLevel::L3DoubleSlash => "L3_SlashSlash",
            HeadingLevel::InNumbered => "IN_Num",
        }
    }

    /// Depth in the heading hierarchy; `L1` and `IN` share the top rank.
    pub fn rank(self) -> u8 {
        match self {
            HeadingLevel::L1Numbered | HeadingLevel::InNumbered => 0,
            HeadingLevel::L2Slash => 1,
            HeadingLevel::L3DoubleSlash => 2,
        }
    }

    pub fn is_top_rank(self) -> bool {
        self.rank() == 0
    }
}

/// Active nesting, outermost first.
pub type HeadingPath = Vec<(HeadingLevel, String)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedHeading {
    pub level: HeadingLevel,
    pub prefix: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    MainSection(String),
    Numbered(NumberedHeading),
    Plain,
}

#[derive(Debug, Clone)]
pub struct HeadingClassifier {
    section_markers: Vec<SectionMarker>,
    numbered_patterns: Vec<(HeadingLevel, Regex)>,
    dot_leader: Regex,
    letter_list_marker: Regex,
    roman_list_marker: Regex,
}

impl HeadingClassifier {
    pub fn new(section_markers: Vec<SectionMarker>) -> Result<Self> {
        // A three-part slash prefix also matches the two-part pattern, so order matters.
        let numbered_patterns = vec![
            (
                HeadingLevel::L3DoubleSlash,
                Regex::new(r"^\s*(\d+\s*/\s*\d+\s*/\s*\d+)\s+(.+)")
                    .context("failed to compile L3 heading regex")?,
            ),
            (
                HeadingLevel::L2Slash,
                Regex::new(r"^\s*(\d+\s*/\s*\d+)\s+(.+)")
                    .context("failed to compile L2 heading regex")?,
            ),
            (
                HeadingLevel::L1Numbered,
                Regex::new(r"^\s*(\d+)\.\s+(.+)").context("failed to compile L1 heading regex")?,
            ),
            (
                HeadingLevel::InNumbered,
                Regex::new(r"^\s*(IN\d+)\s+(.+)").context("failed to compile IN heading regex")?,
            ),
        ];

        Ok(Self {
            section_markers,
            numbered_patterns,
            dot_leader: Regex::new(r"\.{4,}|…{2,}").context("failed to compile dot-leader regex")?,
            letter_list_marker: Regex::new(r"^\s*[a-z]\)\s+")
                .context("failed to compile letter list-marker regex")?,
            roman_list_marker: Regex::new(r"(?i)^\s*[ivx]+\)\s+")
                .context("failed to compile roman list-marker regex")?,
        })
    }

    pub fn classify(&self, line: &str) -> LineClass {
        let cleaned = line.trim();
        if cleaned.is_empty() {
            return LineClass::Plain;
        }

        if let Some(name) = self.match_main_section(cleaned) {
            return LineClass::MainSection(name);
        }

        self.match_numbered_heading(cleaned)
            .map(LineClass::Numbered)
            .unwrap_or(LineClass::Plain)
    }

    pub fn match_main_section(&self, cleaned: &str) -> Option<String> {
        let marker = self
            .section_markers
            .iter()
            .find(|marker| marker.pattern.is_match(cleaned))?;

        if marker.keep_literal {
            Some(first_line(cleaned).to_string())
        } else {
            Some(marker.name.clone())
        }
    }

    pub fn match_numbered_heading(&self, cleaned: &str) -> Option<NumberedHeading> {
        let list_like = self.looks_like_list_item(cleaned);

        for (level, pattern) in &self.numbered_patterns {
            let Some(captures) = pattern.captures(cleaned) else {
                continue;
            };

            let prefix = captures.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            let title = captures.get(2).map(|m| m.as_str().trim()).unwrap_or("");
            if prefix.is_empty() || title.is_empty() {
                return None;
            }

            if self.dot_leader.is_match(title) {
                return None;
            }

            let title_words = title.split_whitespace().count();
            let max_words = if *level == HeadingLevel::L1Numbered {
                MAX_L1_TITLE_WORDS
            } else {
                MAX_TITLE_WORDS
            };
            if title_words > max_words {
                return None;
            }

            // Numbered patterns are anchored on a leading digit or `IN`, so no list-like
            // line reaches this point with the built-in patterns.
            if list_like && title_words < MIN_LIST_LIKE_HEADING_WORDS {
                return None;
            }

            return Some(NumberedHeading {
                level: *level,
                prefix: prefix.to_string(),
                title: title.to_string(),
            });
        }

        None
    }

    pub(super) fn looks_like_list_item(&self, cleaned: &str) -> bool {
        let honorific_with_dash = HONORIFICS
            .iter()
            .any(|honorific| cleaned.starts_with(honorific))
            && cleaned.contains(['-', '–', '—']);

        honorific_with_dash
            || self.letter_list_marker.is_match(cleaned)
            || self.roman_list_marker.is_match(cleaned)
    }
}

pub fn first_line(text: &str) -> &str {
    text.lines().next().map(str::trim).unwrap_or("")
}
