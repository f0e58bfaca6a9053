use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use serde::{Deserialize, Serialize};

use crate::cli::LayoutBackend;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    #[default]
    Text,
    Image,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutBlock {
    pub page_number: u32,
    pub kind: BlockKind,
    pub text: String,
}

impl LayoutBlock {
    pub fn text(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            kind: BlockKind::Text,
            text: text.into(),
        }
    }

    pub fn is_text(&self) -> bool {
        self.kind == BlockKind::Text
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutPage {
    pub page_number: u32,
    pub blocks: Vec<LayoutBlock>,
}

/// Paginated block stream for one source document, in reading order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutDocument {
    pub source_file: String,
    pub pages: Vec<LayoutPage>,
}

impl LayoutDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn text_blocks(&self) -> impl Iterator<Item = &LayoutBlock> {
        self.pages
            .iter()
            .flat_map(|page| page.blocks.iter())
            .filter(|block| block.is_text())
    }

    /// Builds a document from `(page_number, block_text)` pairs.
    #[cfg(test)]
    pub fn from_page_texts(source_file: &str, blocks: &[(u32, &str)]) -> Self {
        let mut pages = Vec::<LayoutPage>::new();
        for (page_number, text) in blocks {
            match pages.last_mut() {
                Some(page) if page.page_number == *page_number => {
                    page.blocks.push(LayoutBlock::text(*page_number, *text));
                }
                _ => pages.push(LayoutPage {
                    page_number: *page_number,
                    blocks: vec![LayoutBlock::text(*page_number, *text)],
                }),
            }
        }

        Self {
            source_file: source_file.to_string(),
            pages,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LayoutDump {
    #[serde(default)]
    source_file: Option<String>,
    #[serde(default)]
    pages: Vec<LayoutDumpPage>,
}

#[derive(Debug, Deserialize)]
struct LayoutDumpPage {
    #[serde(default)]
    page_number: Option<u32>,
    #[serde(default)]
    blocks: Vec<LayoutDumpBlock>,
}

#[derive(Debug, Deserialize)]
struct LayoutDumpBlock {
    #[serde(default)]
    kind: BlockKind,
    #[serde(default)]
    text: String,
}

pub fn load_layout_document(
    path: &Path,
    backend: LayoutBackend,
    max_pages: Option<usize>,
) -> Result<LayoutDocument> {
    let source_file = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

    let mut document = match resolve_backend(path, backend)? {
        LayoutBackend::Json => {
            let raw = fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            parse_layout_json(&raw, &source_file)
                .with_context(|| format!("failed to parse layout dump {}", path.display()))?
        }
        _ => LayoutDocument {
            source_file: source_file.clone(),
            pages: extract_blocks_with_pdftotext(path, max_pages)?,
        },
    };

    if let Some(max_pages) = max_pages {
        document.pages.truncate(max_pages);
    }

    Ok(document)
}

fn resolve_backend(path: &Path, backend: LayoutBackend) -> Result<LayoutBackend> {
    if backend != LayoutBackend::Auto {
        return Ok(backend);
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => Ok(LayoutBackend::Pdftotext),
        "json" => Ok(LayoutBackend::Json),
        _ => bail!(
            "cannot infer layout backend for {} (expected .pdf or .json)",
            path.display()
        ),
    }
}

pub fn parse_layout_json(raw: &[u8], fallback_source_file: &str) -> Result<LayoutDocument> {
    let dump: LayoutDump = serde_json::from_slice(raw).context("invalid layout JSON")?;

    let pages = dump
        .pages
        .into_iter()
        .enumerate()
        .map(|(index, page)| {
            let page_number = page.page_number.unwrap_or(index as u32 + 1);
            LayoutPage {
                page_number,
                blocks: page
                    .blocks
                    .into_iter()
                    .map(|block| LayoutBlock {
                        page_number,
                        kind: block.kind,
                        text: block.text,
                    })
                    .collect(),
            }
        })
        .collect();

    Ok(LayoutDocument {
        source_file: dump
            .source_file
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| fallback_source_file.to_string()),
        pages,
    })
}

fn extract_blocks_with_pdftotext(
    pdf_path: &Path,
    max_pages: Option<usize>,
) -> Result<Vec<LayoutPage>> {
    let mut command = Command::new("pdftotext");
    command
        .arg("-bbox-layout")
        .arg("-enc")
        .arg("UTF-8")
        .arg("-f")
        .arg("1");
    if let Some(max_pages) = max_pages {
        command.arg("-l").arg(max_pages.to_string());
    }
    command.arg(pdf_path).arg("-");

    let output = command
        .output()
        .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    let raw = String::from_utf8_lossy(&output.stdout).replace('\u{0000}', "");
    parse_bbox_layout(&raw)
}

pub fn parse_bbox_layout(xhtml: &str) -> Result<Vec<LayoutPage>> {
    let mut reader = Reader::from_str(xhtml);

    let mut pages = Vec::<LayoutPage>::new();
    let mut blocks = Vec::<LayoutBlock>::new();
    let mut lines = Vec::<String>::new();
    let mut words = Vec::<String>::new();
    let mut word = String::new();
    let mut in_word = false;

    loop {
        match reader
            .read_event()
            .context("failed to parse pdftotext bbox layout")?
        {
            Event::Start(element) => match element.local_name().as_ref() {
                b"page" => blocks.clear(),
                b"block" => lines.clear(),
                b"line" => words.clear(),
                b"word" => {
                    in_word = true;
                    word.clear();
                }
                _ => {}
            },
            Event::Empty(element) if element.local_name().as_ref() == b"page" => {
                pages.push(LayoutPage {
                    page_number: pages.len() as u32 + 1,
                    blocks: Vec::new(),
                });
            }
            Event::Text(text) if in_word => {
                word.push_str(&String::from_utf8_lossy(text.as_ref()));
            }
            Event::GeneralRef(reference) if in_word => {
                if let Some(ch) = reference
                    .resolve_char_ref()
                    .context("invalid character reference in bbox layout")?
                {
                    word.push(ch);
                } else {
                    let entity = String::from_utf8_lossy(reference.as_ref());
                    match resolve_predefined_entity(&entity) {
                        Some(resolved) => word.push_str(resolved),
                        None => {
                            word.push('&');
                            word.push_str(&entity);
                            word.push(';');
                        }
                    }
                }
            }
            Event::End(element) => match element.local_name().as_ref() {
                b"word" => {
                    in_word = false;
                    let text = word.replace('\u{00a0}', " ");
                    let text = text.trim();
                    if !text.is_empty() {
                        words.push(text.to_string());
                    }
                }
                b"line" => {
                    let line = words.join(" ");
                    words.clear();
                    if !line.trim().is_empty() {
                        lines.push(line);
                    }
                }
                b"block" => {
                    if !lines.is_empty() {
                        let page_number = pages.len() as u32 + 1;
                        blocks.push(LayoutBlock::text(
                            page_number,
                            format!("{}\n", lines.join("\n")),
                        ));
                    }
                    lines.clear();
                }
                b"page" => pages.push(LayoutPage {
                    page_number: pages.len() as u32 + 1,
                    blocks: std::mem::take(&mut blocks),
                }),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    while let Some(last_page) = pages.last() {
        if last_page.blocks.is_empty() {
            pages.pop();
            continue;
        }
        break;
    }

    Ok(pages)
}
