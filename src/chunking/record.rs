use serde::{Deserialize, Serialize};

use super::heading::HeadingPath;

const TEXT_SNIPPET_CHARS: usize = 500;
const MAX_NAMESPACE_CHARS: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub source_file: String,
    pub standard_no: String,
    pub standard_name: String,
    pub page_start: u32,
    pub page_end: u32,
    pub main_section: String,
    pub heading_path: HeadingPath,
    pub content: String,
}

/// Flat, string-typed metadata accepted by the vector store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VectorMetadata {
    pub source_file: String,
    pub standard_no: String,
    pub standard_name: String,
    pub page_start: String,
    pub page_end: String,
    pub main_section: String,
    pub text_snippet: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub heading_path: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VectorRecord {
    pub id: String,
    pub namespace: String,
    pub content: String,
    pub metadata: VectorMetadata,
}

impl Chunk {
    pub fn heading_path_labels(&self) -> Vec<String> {
        self.heading_path
            .iter()
            .map(|(level, title)| format!("{}: {}", level.as_str(), title))
            .collect()
    }

    pub fn to_vector_record(&self, id: String, namespace: &str) -> VectorRecord {
        VectorRecord {
            id,
            namespace: namespace.to_string(),
            content: self.content.clone(),
            metadata: VectorMetadata {
                source_file: self.source_file.clone(),
                standard_no: self.standard_no.clone(),
                standard_name: self.standard_name.clone(),
                page_start: self.page_start.to_string(),
                page_end: self.page_end.to_string(),
                main_section: self.main_section.clone(),
                text_snippet: self.content.chars().take(TEXT_SNIPPET_CHARS).collect(),
                heading_path: self.heading_path_labels(),
            },
        }
    }
}

/// Document key derived from a filename: the name without its last extension.
pub fn document_stem(filename: &str) -> &str {
    filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .filter(|stem| !stem.is_empty())
        .unwrap_or(filename)
}

pub fn chunk_record_id(doc_id: &str, chunk_seq: usize) -> String {
    format!("{doc_id}:{chunk_seq:04}")
}

pub fn vector_records(doc_id: &str, chunks: &[Chunk], namespace: &str) -> Vec<VectorRecord> {
    let namespace = clean_namespace(namespace);
    chunks
        .iter()
        .enumerate()
        .map(|(chunk_seq, chunk)| {
            chunk.to_vector_record(chunk_record_id(doc_id, chunk_seq), &namespace)
        })
        .collect()
}

pub fn clean_namespace(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join("_")
        .chars()
        .filter(|character| {
            character.is_ascii_lowercase()
                || character.is_ascii_digit()
                || *character == '_'
                || *character == '-'
        })
        .take(MAX_NAMESPACE_CHARS)
        .collect()
}
