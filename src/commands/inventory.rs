use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::cli::InventoryArgs;
use crate::model::{DocumentEntry, DocumentInventoryManifest};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub const INVENTORY_MANIFEST_FILENAME: &str = "document_inventory.json";

const DOCUMENT_EXTENSIONS: [&str; 2] = ["pdf", "json"];

pub fn run(args: InventoryArgs) -> Result<()> {
    let catalog = Catalog::load(args.catalog_path.as_deref())?;
    let manifest = build_manifest(&args.cache_root, &catalog)?;

    if args.dry_run {
        info!(
            document_count = manifest.document_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args.manifest_path.unwrap_or_else(|| {
        args.cache_root
            .join("manifests")
            .join(INVENTORY_MANIFEST_FILENAME)
    });

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(document_count = manifest.document_count, "inventory completed");

    Ok(())
}

pub fn build_manifest(source_dir: &Path, catalog: &Catalog) -> Result<DocumentInventoryManifest> {
    let mut paths = discover_documents(source_dir)?;
    paths.sort();

    if paths.is_empty() {
        bail!("no .pdf or .json documents found in {}", source_dir.display());
    }

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

        let identity = catalog.identity.identity_from_filename(&filename);
        debug!(
            filename = %filename,
            standard_no = %identity.standard_no,
            standard_name = %identity.standard_name,
            "inventoried document"
        );

        documents.push(DocumentEntry {
            sha256: sha256_file(&path)?,
            filename,
            standard_no: identity.standard_no,
            standard_name: identity.standard_name,
        });
    }

    Ok(DocumentInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: source_dir.display().to_string(),
        document_count: documents.len(),
        documents,
    })
}

fn discover_documents(source_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut documents = Vec::new();

    let entries = fs::read_dir(source_dir)
        .with_context(|| format!("failed to read {}", source_dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", source_dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let is_document = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                DOCUMENT_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
            .unwrap_or(false);

        if is_document {
            documents.push(path);
        }
    }

    Ok(documents)
}
