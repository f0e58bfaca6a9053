use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::Connection;
use tracing::{debug, info, warn};

use super::db_setup::{
    configure_connection, count_rows, ensure_schema, replace_document, sync_fts_index,
};
use super::pipeline::{StandardFilter, process_documents};
use super::tools_and_manifest::{collect_tool_versions, render_ingest_command};
use super::{DB_SCHEMA_VERSION, DEFAULT_DB_FILENAME, DEFAULT_EXPORT_FILENAME};
use crate::catalog::Catalog;
use crate::chunking::{LayoutOptions, VectorRecord, vector_records};
use crate::cli::IngestArgs;
use crate::commands::inventory::{self, INVENTORY_MANIFEST_FILENAME};
use crate::model::{DocumentInventoryManifest, IngestCounts, IngestPaths, IngestRunManifest};
use crate::util::{
    ensure_directory, now_utc_string, utc_compact_string, write_json_pretty, write_jsonl,
};

pub fn run(args: IngestArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let cache_root = args.cache_root.clone();
    let manifest_dir = cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;

    let inventory_manifest_path = args
        .inventory_manifest_path
        .clone()
        .unwrap_or_else(|| manifest_dir.join(INVENTORY_MANIFEST_FILENAME));
    let ingest_manifest_path = args.ingest_manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!(
            "ingest_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| cache_root.join(DEFAULT_DB_FILENAME));
    let export_path = args
        .export_path
        .clone()
        .unwrap_or_else(|| cache_root.join("exports").join(DEFAULT_EXPORT_FILENAME));

    info!(cache_root = %cache_root.display(), run_id = %run_id, "starting ingest");

    let catalog = Catalog::load(args.catalog_path.as_deref())?;
    let inventory = load_or_refresh_inventory(
        &cache_root,
        &inventory_manifest_path,
        &catalog,
        args.refresh_inventory,
    )?;

    let filter = StandardFilter::new(&args.standards);
    let documents = inventory
        .documents
        .iter()
        .filter(|entry| filter.admits_entry(entry))
        .cloned()
        .collect::<Vec<_>>();
    if documents.is_empty() {
        warn!(standards = ?args.standards, "no inventoried documents matched the standard filter");
    }

    let options = LayoutOptions {
        backend: args.layout_backend,
        max_pages: args.max_pages_per_doc,
    };
    let outcomes = process_documents(&cache_root, &documents, &catalog, options, args.jobs)?;

    let mut connection = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;

    let mut counts = IngestCounts {
        document_count: inventory.document_count,
        ..IngestCounts::default()
    };
    let mut warnings = Vec::<String>::new();
    let mut records = Vec::<VectorRecord>::new();
    let mut source_hashes = Vec::with_capacity(outcomes.len());

    let tx = connection.transaction()?;
    for outcome in &outcomes {
        let processed = match &outcome.result {
            Ok(processed) => processed,
            Err(err) => {
                counts.failed_document_count += 1;
                warnings.push(format!("{}: {err:#}", outcome.entry.filename));
                source_hashes.push(outcome.entry.clone());
                continue;
            }
        };

        if !filter.admits_processed(&outcome.entry, &processed.identity) {
            debug!(
                filename = %outcome.entry.filename,
                standard_no = %processed.identity.standard_no,
                "document excluded by standard filter"
            );
            continue;
        }

        if !processed.identity.is_resolved() {
            counts.unresolved_identity_count += 1;
            warnings.push(format!(
                "{}: standard identity unresolved (no={}, name={})",
                outcome.entry.filename,
                processed.identity.standard_no,
                processed.identity.standard_name
            ));
        }
        if processed.chunks.is_empty() {
            warnings.push(format!("{}: no chunks produced", outcome.entry.filename));
        }

        counts.chunks_inserted += replace_document(
            &tx,
            &outcome.entry,
            &processed.identity,
            processed.page_count,
            &processed.chunks,
        )?;
        counts.processed_document_count += 1;
        source_hashes.push(outcome.entry.clone());
        counts.pages_processed += processed.page_count;

        records.extend(vector_records(
            &outcome.entry.doc_id(),
            &processed.chunks,
            &args.namespace,
        ));
    }
    tx.commit()?;

    sync_fts_index(&connection)?;

    write_jsonl(&export_path, &records)?;
    counts.records_exported = records.len();
    info!(
        path = %export_path.display(),
        records = records.len(),
        "wrote vector record export"
    );

    counts.docs_total = count_rows(&connection, "SELECT COUNT(*) FROM docs")?;
    counts.chunks_total = count_rows(&connection, "SELECT COUNT(*) FROM chunks")?;

    let status = if counts.failed_document_count == 0 {
        "completed"
    } else {
        "completed_with_warnings"
    };

    let manifest = IngestRunManifest {
        manifest_version: 1,
        run_id,
        db_schema_version: DB_SCHEMA_VERSION.to_string(),
        status: status.to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_ingest_command(&args),
        namespace: args.namespace.clone(),
        tool_versions: collect_tool_versions(args.layout_backend),
        paths: IngestPaths {
            cache_root: cache_root.display().to_string(),
            manifest_dir: manifest_dir.display().to_string(),
            inventory_manifest_path: inventory_manifest_path.display().to_string(),
            db_path: db_path.display().to_string(),
            export_path: export_path.display().to_string(),
        },
        counts,
        source_hashes,
        warnings,
    };

    write_json_pretty(&ingest_manifest_path, &manifest)?;

    info!(path = %ingest_manifest_path.display(), "wrote ingest run manifest");
    info!(
        docs = manifest.counts.docs_total,
        chunks = manifest.counts.chunks_total,
        failed = manifest.counts.failed_document_count,
        unresolved = manifest.counts.unresolved_identity_count,
        "ingest completed"
    );

    Ok(())
}

fn load_or_refresh_inventory(
    cache_root: &Path,
    inventory_manifest_path: &Path,
    catalog: &Catalog,
    refresh_inventory: bool,
) -> Result<DocumentInventoryManifest> {
    if refresh_inventory || !inventory_manifest_path.exists() {
        let manifest = inventory::build_manifest(cache_root, catalog)?;
        write_json_pretty(inventory_manifest_path, &manifest)?;
        info!(
            path = %inventory_manifest_path.display(),
            document_count = manifest.document_count,
            "refreshed inventory manifest"
        );
        return Ok(manifest);
    }

    let raw = fs::read(inventory_manifest_path)
        .with_context(|| format!("failed to read {}", inventory_manifest_path.display()))?;
    let manifest: DocumentInventoryManifest = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", inventory_manifest_path.display()))?;

    info!(
        path = %inventory_manifest_path.display(),
        document_count = manifest.document_count,
        "loaded existing inventory manifest"
    );

    Ok(manifest)
}
