use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::chunking::{Chunk, DocumentProcessor, LayoutOptions, document_stem, vector_records};
use crate::cli::{ChunkArgs, OutputFormat};

const SUMMARY_SECTION_CHARS: usize = 40;
const SUMMARY_HEADING_CHARS: usize = 40;

pub fn run(args: ChunkArgs) -> Result<()> {
    let catalog = Catalog::load(args.catalog_path.as_deref())?;
    let options = LayoutOptions {
        backend: args.layout_backend,
        max_pages: args.max_pages_per_doc,
    };

    let chunks = DocumentProcessor::new(&catalog).process_path(&args.input, options);
    if chunks.is_empty() {
        warn!(path = %args.input.display(), "no chunks produced");
    } else {
        info!(path = %args.input.display(), chunks = chunks.len(), "chunked document");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match args.format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &chunks).context("failed to write chunks")?;
            writeln!(out).context("failed to write chunks")?;
        }
        OutputFormat::Jsonl => {
            let filename = args
                .input
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default();
            for record in vector_records(document_stem(filename), &chunks, &args.namespace) {
                serde_json::to_writer(&mut out, &record).context("failed to write record")?;
                writeln!(out).context("failed to write record")?;
            }
        }
        OutputFormat::Summary => {
            out.write_all(render_summary(&chunks).as_bytes())
                .context("failed to write chunk summary")?;
        }
    }

    out.flush().context("failed to flush stdout")?;
    Ok(())
}

fn render_summary(chunks: &[Chunk]) -> String {
    let mut lines = vec![format!(
        "{:>5}  {:>9}  {:>7}  {:<section$}  {}",
        "#",
        "pages",
        "chars",
        "main section",
        "first heading",
        section = SUMMARY_SECTION_CHARS
    )];

    for (index, chunk) in chunks.iter().enumerate() {
        let pages = if chunk.page_start == chunk.page_end {
            chunk.page_start.to_string()
        } else {
            format!("{}-{}", chunk.page_start, chunk.page_end)
        };
        let first_heading = chunk
            .heading_path
            .first()
            .map(|(level, title)| format!("{}: {}", level.as_str(), title))
            .unwrap_or_else(|| "-".to_string());

        lines.push(format!(
            "{:>5}  {:>9}  {:>7}  {:<section$}  {}",
            index + 1,
            pages,
            chunk.content.chars().count(),
            truncate_chars(&chunk.main_section, SUMMARY_SECTION_CHARS),
            truncate_chars(&first_heading, SUMMARY_HEADING_CHARS),
            section = SUMMARY_SECTION_CHARS
        ));
    }

    lines.push(format!("{} chunks", chunks.len()));
    let mut rendered = lines.join("\n");
    rendered.push('\n');
    rendered
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let mut truncated = text
        .chars()
        .take(max_chars.saturating_sub(3))
        .collect::<String>();
    truncated.push_str("...");
    truncated
}
