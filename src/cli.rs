use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "fas-chunker",
    version,
    about = "Structure-aware chunking of AAOIFI FAS/SS standards"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inventory(InventoryArgs),
    Ingest(IngestArgs),
    Chunk(ChunkArgs),
    Status(StatusArgs),
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum LayoutBackend {
    #[default]
    Auto,
    Pdftotext,
    Json,
}

impl LayoutBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Pdftotext => "pdftotext",
            Self::Json => "json",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Jsonl,
    Summary,
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = ".cache/fas")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub catalog_path: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[arg(long, default_value = ".cache/fas")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub catalog_path: Option<PathBuf>,

    #[arg(long)]
    pub inventory_manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub ingest_manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub export_path: Option<PathBuf>,

    #[arg(long, default_value = "fas_full")]
    pub namespace: String,

    #[arg(long, default_value_t = false)]
    pub refresh_inventory: bool,

    /// Only ingest documents whose resolved standard number or document id matches.
    #[arg(long = "standard")]
    pub standards: Vec<String>,

    #[arg(long)]
    pub max_pages_per_doc: Option<usize>,

    #[arg(long, value_enum, default_value_t = LayoutBackend::Auto)]
    pub layout_backend: LayoutBackend,

    /// Worker threads for document fan-out; defaults to the rayon global pool.
    #[arg(long)]
    pub jobs: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct ChunkArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub catalog_path: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    #[arg(long, default_value = "fas_full")]
    pub namespace: String,

    #[arg(long)]
    pub max_pages_per_doc: Option<usize>,

    #[arg(long, value_enum, default_value_t = LayoutBackend::Auto)]
    pub layout_backend: LayoutBackend,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/fas")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}
