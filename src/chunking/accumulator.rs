use super::context::SectionContext;
use super::identity::StandardIdentity;
use super::record::Chunk;

/// Document-level fields stamped onto every chunk of one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSource {
    pub source_file: String,
    pub identity: StandardIdentity,
}

#[derive(Debug, Default)]
pub struct ChunkAccumulator {
    buffer: String,
    page_start: Option<u32>,
}

impl ChunkAccumulator {
    pub fn append(&mut self, text: &str, page_number: u32) {
        if text.is_empty() {
            return;
        }

        if self.page_start.is_none() {
            self.page_start = Some(page_number);
        }

        self.buffer.push_str(text);
        if !text.ends_with('\n') {
            self.buffer.push('\n');
        }
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.page_start = None;
    }

    /// Emits the buffered text under `context`; the buffer is cleared either way.
    pub fn finalize(
        &mut self,
        source: &ChunkSource,
        context: &SectionContext,
        page_end: u32,
    ) -> Option<Chunk> {
        let content = self.buffer.trim().to_string();
        let page_start = self.page_start.unwrap_or(page_end);
        self.clear();

        if content.is_empty() {
            return None;
        }

        Some(Chunk {
            source_file: source.source_file.clone(),
            standard_no: source.identity.standard_no.clone(),
            standard_name: source.identity.standard_name.clone(),
            page_start,
            page_end: page_end.max(page_start),
            main_section: context.main_section.clone(),
            heading_path: context.heading_path.clone(),
            content,
        })
    }
}
