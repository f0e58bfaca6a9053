use std::path::Path;

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::chunking::{
    DocumentProcessor, LayoutOptions, ProcessedDocument, StandardIdentity, UNKNOWN,
};
use crate::model::DocumentEntry;

pub(super) struct DocumentOutcome {
    pub entry: DocumentEntry,
    pub result: Result<ProcessedDocument>,
}

/// Processes documents in parallel; output order follows `documents`.
pub(super) fn process_documents(
    source_dir: &Path,
    documents: &[DocumentEntry],
    catalog: &Catalog,
    options: LayoutOptions,
    jobs: Option<usize>,
) -> Result<Vec<DocumentOutcome>> {
    let processor = DocumentProcessor::new(catalog);

    let process_all = || {
        documents
            .par_iter()
            .map(|entry| {
                let path = source_dir.join(&entry.filename);
                let result = processor.try_process_path(&path, options);
                match &result {
                    Ok(processed) => info!(
                        filename = %entry.filename,
                        pages = processed.page_count,
                        chunks = processed.chunks.len(),
                        "document chunked"
                    ),
                    Err(err) => warn!(
                        filename = %entry.filename,
                        error = %err,
                        "failed to open document; skipping"
                    ),
                }
                DocumentOutcome {
                    entry: entry.clone(),
                    result,
                }
            })
            .collect::<Vec<DocumentOutcome>>()
    };

    match jobs {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .context("failed to build document worker pool")?;
            Ok(pool.install(process_all))
        }
        None => Ok(process_all()),
    }
}

/// `--standard` selection, applied to the resolved identity of each document.
#[derive(Debug, Clone, Default)]
pub(super) struct StandardFilter {
    wanted: Vec<String>,
}

impl StandardFilter {
    pub fn new(standards: &[String]) -> Self {
        Self {
            wanted: standards
                .iter()
                .map(|wanted| wanted.trim().to_string())
                .filter(|wanted| !wanted.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.wanted.is_empty()
    }

    /// Entries whose number is unknown from the filename stay in until their first page is read.
    pub fn admits_entry(&self, entry: &DocumentEntry) -> bool {
        self.is_empty() || entry.standard_no == UNKNOWN || self.matches(&entry.standard_no, entry)
    }

    pub fn admits_processed(&self, entry: &DocumentEntry, identity: &StandardIdentity) -> bool {
        self.is_empty() || self.matches(&identity.standard_no, entry)
    }

    fn matches(&self, standard_no: &str, entry: &DocumentEntry) -> bool {
        let doc_id = entry.doc_id();
        self.wanted
            .iter()
            .any(|wanted| wanted == standard_no || wanted.eq_ignore_ascii_case(&doc_id))
    }
}
