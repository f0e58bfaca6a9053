use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::chunking::UNKNOWN;
use crate::cli::StatusArgs;
use crate::commands::ingest::DEFAULT_DB_FILENAME;
use crate::commands::inventory::INVENTORY_MANIFEST_FILENAME;
use crate::model::{DocumentInventoryManifest, IngestRunManifest};

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");
    let inventory_path = manifest_dir.join(INVENTORY_MANIFEST_FILENAME);
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join(DEFAULT_DB_FILENAME));

    info!(cache_root = %args.cache_root.display(), "status requested");

    if inventory_path.exists() {
        let raw = fs::read(&inventory_path)
            .with_context(|| format!("failed to read {}", inventory_path.display()))?;
        let inventory: DocumentInventoryManifest = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", inventory_path.display()))?;

        let unresolved = inventory
            .documents
            .iter()
            .filter(|entry| entry.standard_name == UNKNOWN)
            .count();
        info!(
            generated_at = %inventory.generated_at,
            document_count = inventory.document_count,
            unnamed_by_filename = unresolved,
            "loaded inventory manifest"
        );
    } else {
        warn!(path = %inventory_path.display(), "inventory manifest missing");
    }

    match latest_ingest_manifest(&manifest_dir)? {
        Some(path) => {
            let raw =
                fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
            let manifest: IngestRunManifest = serde_json::from_slice(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?;

            info!(
                run_id = %manifest.run_id,
                status = %manifest.status,
                updated_at = %manifest.updated_at,
                processed = manifest.counts.processed_document_count,
                failed = manifest.counts.failed_document_count,
                unresolved = manifest.counts.unresolved_identity_count,
                chunks = manifest.counts.chunks_inserted,
                warnings = manifest.warnings.len(),
                "loaded latest ingest manifest"
            );
        }
        None => warn!(path = %manifest_dir.display(), "no ingest run manifest found"),
    }

    if db_path.exists() {
        let conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        let docs_count = query_count(&conn, "SELECT COUNT(*) FROM docs").unwrap_or(0);
        let chunks_count = query_count(&conn, "SELECT COUNT(*) FROM chunks").unwrap_or(0);
        let schema_version = conn
            .query_row(
                "SELECT value FROM metadata WHERE key = 'db_schema_version'",
                [],
                |row| row.get::<_, String>(0),
            )
            .unwrap_or_default();

        info!(
            path = %db_path.display(),
            schema_version = %schema_version,
            docs = docs_count,
            chunks = chunks_count,
            "database status"
        );
    } else {
        warn!(path = %db_path.display(), "database file missing");
    }

    Ok(())
}

fn query_count(conn: &Connection, sql: &str) -> Result<i64> {
    let count = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}

/// Run manifests carry a compact UTC timestamp, so the lexically last name is the newest.
fn latest_ingest_manifest(manifest_dir: &Path) -> Result<Option<PathBuf>> {
    if !manifest_dir.exists() {
        return Ok(None);
    }

    let entries = fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to read {}", manifest_dir.display()))?;

    let mut candidates = Vec::<PathBuf>::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", manifest_dir.display()))?;
        let path = entry.path();
        let is_run_manifest = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with("ingest_run") && name.ends_with(".json"))
            .unwrap_or(false);
        if is_run_manifest {
            candidates.push(path);
        }
    }

    candidates.sort();
    Ok(candidates.pop())
}
