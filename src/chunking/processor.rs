use std::path::Path;

use anyhow::Result;
use tracing::{debug, info, warn};

use super::accumulator::{ChunkAccumulator, ChunkSource};
use super::context::{LineDisposition, SectionContext};
use super::heading::LineClass;
use super::identity::StandardIdentity;
use super::layout::{LayoutDocument, load_layout_document};
use super::record::Chunk;
use crate::catalog::Catalog;
use crate::cli::LayoutBackend;

#[derive(Debug, Clone, Copy)]
pub struct LayoutOptions {
    pub backend: LayoutBackend,
    pub max_pages: Option<usize>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            backend: LayoutBackend::Auto,
            max_pages: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedDocument {
    pub identity: StandardIdentity,
    pub page_count: usize,
    pub chunks: Vec<Chunk>,
}

#[derive(Debug, Clone, Copy)]
pub struct DocumentProcessor<'a> {
    catalog: &'a Catalog,
}

impl<'a> DocumentProcessor<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Unreadable documents are logged and yield no chunks.
    pub fn process_path(&self, path: &Path, options: LayoutOptions) -> Vec<Chunk> {
        match load_layout_document(path, options.backend, options.max_pages) {
            Ok(document) => self.process(&document),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to open document");
                Vec::new()
            }
        }
    }

    pub fn try_process_path(&self, path: &Path, options: LayoutOptions) -> Result<ProcessedDocument> {
        let document = load_layout_document(path, options.backend, options.max_pages)?;
        Ok(self.process_detailed(&document))
    }

    pub fn process(&self, document: &LayoutDocument) -> Vec<Chunk> {
        self.process_detailed(document).chunks
    }

    pub fn process_detailed(&self, document: &LayoutDocument) -> ProcessedDocument {
        let identity = self
            .catalog
            .identity
            .resolve(&document.source_file, document);
        info!(
            source_file = %document.source_file,
            standard_no = %identity.standard_no,
            standard_name = %identity.standard_name,
            pages = document.page_count(),
            "processing document"
        );

        let source = ChunkSource {
            source_file: document.source_file.clone(),
            identity: identity.clone(),
        };

        let mut chunks = Vec::<Chunk>::new();
        let mut context = SectionContext::default();
        let mut accumulator = ChunkAccumulator::default();
        let mut last_page = 0u32;

        for block in document.text_blocks() {
            let cleaned = block.text.trim();
            if cleaned.is_empty() {
                continue;
            }

            let class = self.catalog.classifier.classify(cleaned);
            let transition = context.advance(&class);
            if transition.next.main_section != context.main_section
                || transition.next.mode != context.mode
            {
                debug!(
                    page = block.page_number,
                    from = %context.main_section,
                    to = %transition.next.main_section,
                    skipping_toc = transition.next.is_skipping_toc(),
                    "section change"
                );
            }

            if transition.close_chunk {
                if let Some(chunk) = accumulator.finalize(&source, &context, last_page) {
                    chunks.push(chunk);
                }
            }

            let mut next = transition.next;
            match transition.line {
                LineDisposition::Append => accumulator.append(&block.text, block.page_number),
                LineDisposition::AppendRemainder => {
                    if let Some(remainder) = marker_remainder(&class, &block.text) {
                        accumulator.append(remainder, block.page_number);
                        // Body text already follows the marker, so the next heading closes it.
                        next.awaiting_first_content = false;
                    }
                }
                LineDisposition::Drop => {}
            }

            context = next;
            last_page = block.page_number;
        }

        if context.is_skipping_toc() {
            accumulator.clear();
        } else if let Some(chunk) = accumulator.finalize(&source, &context, last_page) {
            chunks.push(chunk);
        }

        info!(
            source_file = %document.source_file,
            chunks = chunks.len(),
            "finished document"
        );

        ProcessedDocument {
            identity,
            page_count: document.page_count(),
            chunks,
        }
    }
}

/// Text of a marker block after its first line, if the block carried more than the marker.
fn marker_remainder<'t>(class: &LineClass, text: &'t str) -> Option<&'t str> {
    if !matches!(class, LineClass::MainSection(_)) {
        return None;
    }

    text.trim_start()
        .split_once('\n')
        .map(|(_, rest)| rest)
        .filter(|rest| !rest.trim().is_empty())
}
