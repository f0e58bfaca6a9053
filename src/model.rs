use serde::{Deserialize, Serialize};

use crate::chunking::document_stem;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub filename: String,
    pub standard_no: String,
    pub standard_name: String,
    pub sha256: String,
}

impl DocumentEntry {
    pub fn doc_id(&self) -> String {
        document_stem(&self.filename).to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub document_count: usize,
    pub documents: Vec<DocumentEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolVersions {
    pub engine: String,
    pub layout_backend: String,
    pub pdftotext: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestPaths {
    pub cache_root: String,
    pub manifest_dir: String,
    pub inventory_manifest_path: String,
    pub db_path: String,
    pub export_path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestCounts {
    pub document_count: usize,
    pub processed_document_count: usize,
    pub failed_document_count: usize,
    pub unresolved_identity_count: usize,
    pub pages_processed: usize,
    pub chunks_inserted: usize,
    pub records_exported: usize,
    pub docs_total: i64,
    pub chunks_total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub db_schema_version: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub namespace: String,
    pub tool_versions: ToolVersions,
    pub paths: IngestPaths,
    pub counts: IngestCounts,
    pub source_hashes: Vec<DocumentEntry>,
    pub warnings: Vec<String>,
}
