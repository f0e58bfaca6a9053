use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chunking::{HeadingClassifier, IdentityResolver};

const APPENDIX_MARKER_PATTERN: &str = r"(?i)^\s*Appendix\s*\(?[A-Z0-9]\)?";

const DEFAULT_SECTION_MARKERS: &[&str] = &[
    "Contents",
    "Preface",
    "Introduction",
    "Objective of the standard",
    "Scope",
    "Definitions",
    "Statement of the Standard",
    "Effective date",
    "Transitional provisions",
    "Amendments to other standards",
    "Identifying (and separating) an Ijarah",
    "Accounting and financial reporting by the lessee",
    "Accounting and financial reporting by the lessor",
    "Ijarah MBT: transfer of underlying asset’s ownership",
    "Sale and Ijarah-back transactions",
    "Murabaha and other deferred payment sales in the financial statements of the seller",
    "Murabaha and other deferred payment sales in the financial statements of the buyer",
    "Accounting treatments",
    "Scope of the Standard",
    "Procedures Prior to the Contract of Murabahah",
    "First Category: Traditional Fiqh-Nominate Partnerships",
    "Second Category: Modern Corporations",
    "Promise to Lease",
    "Acquisition of the Asset",
    "Contract of Salam",
    "Subject Matter of Salam",
    "Changes to al-Muslam Fihi",
    "Parallel Salam",
    "Salam Sukuk Issues",
    "Concluding an Ijarah Contract",
    "Definitions, Classifications and Types",
    "Subject Matter of Ijarah",
    "Guarantees and Treatment of Ijarah Receivables",
    "Diminishing Musharakah",
    "Changes to the Ijarah Contract",
    "Acquisition of Title",
    "Transfer of the Ownership in the Leased Property",
    "Conclusion",
    "Guarantees and Treatment",
    "Appendices",
];

const DEFAULT_KNOWN_TITLES: &[&str] = &[
    "Ijarah",
    "Murabaha and Other Deferred Payment Sales",
    "Musharaka Financing",
    "Istisna'a and Parallel Istisna'a",
];

const DEFAULT_DOCUMENT_NAMES: &[(&str, &str)] = &[
    ("FAS_32.pdf", "FAS_32_Ijarah"),
    (
        "FAS_28_Murabaha_Deferred_Payment_Sales.pdf",
        "FAS_28_Murabaha_Deferred_Payment_Sales",
    ),
    ("FAS_10_Istisna.pdf", "FAS_10_Istisna"),
    ("FAS_7_Salam_Parallel_Salam.pdf", "FAS_7_Salam_Parallel_Salam"),
    ("FAS_4_Musharaka.pdf", "FAS_4_Musharaka"),
    ("SS_8_Murabahah.pdf", "SS_8_Murabahah"),
    (
        "SS_9_Ijarah_Ijarah_Muntahia_Bittamleek.pdf",
        "SS_9_Ijarah_Ijarah_Muntahia_Bittamleek",
    ),
    ("SS_10_Salam_Parallel_Salam.pdf", "SS_10_Salam_Parallel_Salam"),
    ("SS_12_Musharakah.pdf", "SS_12_Musharakah"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentOverride {
    pub filename: String,
    #[serde(default)]
    pub standard_no: Option<String>,
    pub standard_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionMarkerConfig {
    pub name: String,
    /// Full regex; when absent the name must match the whole line, case-insensitively.
    #[serde(default)]
    pub pattern: Option<String>,
}

/// On-disk catalog. Any table left out falls back to the built-in one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub documents: Option<Vec<DocumentOverride>>,
    #[serde(default)]
    pub known_titles: Option<Vec<String>>,
    #[serde(default)]
    pub section_markers: Option<Vec<SectionMarkerConfig>>,
}

impl CatalogConfig {
    pub fn builtin() -> Self {
        Self {
            documents: Some(default_document_overrides()),
            known_titles: Some(
                DEFAULT_KNOWN_TITLES
                    .iter()
                    .map(|title| title.to_string())
                    .collect(),
            ),
            section_markers: Some(default_section_markers()),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_slice(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }
}

fn default_document_overrides() -> Vec<DocumentOverride> {
    DEFAULT_DOCUMENT_NAMES
        .iter()
        .map(|(filename, name)| DocumentOverride {
            filename: filename.to_string(),
            standard_no: None,
            standard_name: name.to_string(),
        })
        .collect()
}

fn default_section_markers() -> Vec<SectionMarkerConfig> {
    let mut markers = DEFAULT_SECTION_MARKERS
        .iter()
        .map(|name| SectionMarkerConfig {
            name: name.to_string(),
            pattern: None,
        })
        .collect::<Vec<SectionMarkerConfig>>();
    markers.push(SectionMarkerConfig {
        name: "Appendix".to_string(),
        pattern: Some(APPENDIX_MARKER_PATTERN.to_string()),
    });
    markers
}

#[derive(Debug, Clone)]
pub struct SectionMarker {
    pub name: String,
    pub pattern: Regex,
    /// Return the matched line instead of the canonical name.
    pub keep_literal: bool,
}

impl SectionMarker {
    pub fn compile(config: &SectionMarkerConfig) -> Result<Self> {
        let name = config.name.trim().to_string();
        let pattern = match &config.pattern {
            Some(pattern) => Regex::new(pattern),
            None => Regex::new(&whole_line_pattern(&name)),
        }
        .with_context(|| format!("failed to compile section marker regex for '{name}'"))?;

        let keep_literal = name.eq_ignore_ascii_case("Appendix")
            || name.eq_ignore_ascii_case("Appendices")
            || name.split_whitespace().count() > 3;

        Ok(Self {
            name,
            pattern,
            keep_literal,
        })
    }
}

fn whole_line_pattern(phrase: &str) -> String {
    let words = phrase
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<String>>();
    format!(r"(?i)^\s*{}\s*$", words.join(r"\s+"))
}

pub fn known_title_pattern(title: &str) -> Result<Regex> {
    Regex::new(&whole_line_pattern(title))
        .with_context(|| format!("failed to compile known title regex for '{title}'"))
}

/// Dedupes by name while keeping first-seen order; the last definition wins.
fn dedupe_markers(markers: &[SectionMarkerConfig]) -> Vec<SectionMarkerConfig> {
    let mut positions = HashMap::<String, usize>::new();
    let mut deduped = Vec::<SectionMarkerConfig>::new();

    for marker in markers {
        let key = marker.name.trim().to_string();
        if key.is_empty() {
            continue;
        }
        match positions.get(&key) {
            Some(index) => deduped[*index] = marker.clone(),
            None => {
                positions.insert(key, deduped.len());
                deduped.push(marker.clone());
            }
        }
    }

    deduped
}

/// Compiled read-only tables shared by every document pass.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub classifier: HeadingClassifier,
    pub identity: IdentityResolver,
}

impl Catalog {
    pub fn from_config(config: CatalogConfig) -> Result<Self> {
        let builtin = CatalogConfig::builtin();

        let marker_configs = config
            .section_markers
            .or(builtin.section_markers)
            .unwrap_or_default();
        let section_markers = dedupe_markers(&marker_configs)
            .iter()
            .map(SectionMarker::compile)
            .collect::<Result<Vec<SectionMarker>>>()?;

        let documents = config.documents.or(builtin.documents).unwrap_or_default();
        let known_titles = config
            .known_titles
            .or(builtin.known_titles)
            .unwrap_or_default();

        Ok(Self {
            classifier: HeadingClassifier::new(section_markers)?,
            identity: IdentityResolver::new(documents, &known_titles)?,
        })
    }

    pub fn builtin() -> Result<Self> {
        Self::from_config(CatalogConfig::builtin())
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let config = CatalogConfig::load(path)?;
                info!(path = %path.display(), "loaded catalog overrides");
                Self::from_config(config)
            }
            None => Self::builtin(),
        }
    }
}
