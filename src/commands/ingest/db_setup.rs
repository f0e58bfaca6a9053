use anyhow::{Context, Result};
use rusqlite::{Connection, Transaction, params};

use super::DB_SCHEMA_VERSION;
use crate::chunking::{Chunk, StandardIdentity, chunk_record_id};
use crate::model::DocumentEntry;
use crate::util::{now_utc_string, sha256_text};

pub(super) fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    connection
        .pragma_update(None, "foreign_keys", "ON")
        .context("failed to enable foreign_keys")?;
    Ok(())
}

pub(super) fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS docs (
              doc_id TEXT PRIMARY KEY,
              filename TEXT NOT NULL,
              sha256 TEXT NOT NULL,
              standard_no TEXT NOT NULL,
              standard_name TEXT NOT NULL,
              page_count INTEGER NOT NULL DEFAULT 0,
              chunk_count INTEGER NOT NULL DEFAULT 0,
              ingested_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS chunks (
              chunk_id TEXT PRIMARY KEY,
              doc_id TEXT NOT NULL,
              chunk_seq INTEGER NOT NULL,
              standard_no TEXT NOT NULL,
              standard_name TEXT NOT NULL,
              main_section TEXT NOT NULL,
              heading_path TEXT NOT NULL,
              page_start INTEGER NOT NULL,
              page_end INTEGER NOT NULL,
              content TEXT NOT NULL,
              source_hash TEXT NOT NULL,
              FOREIGN KEY(doc_id) REFERENCES docs(doc_id)
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_doc_seq ON chunks(doc_id, chunk_seq);
            CREATE INDEX IF NOT EXISTS idx_chunks_standard_section ON chunks(standard_no, main_section);
            ",
        )
        .context("failed to initialize sqlite schema")?;

    connection
        .execute(
            "
            CREATE VIRTUAL TABLE IF NOT EXISTS chunks_fts
            USING fts5(chunk_id, doc_id, main_section, content, content='chunks', content_rowid='rowid')
            ",
            [],
        )
        .context("failed to initialize FTS5 table chunks_fts")?;

    upsert_metadata(connection, "db_schema_version", DB_SCHEMA_VERSION)?;
    upsert_metadata(connection, "db_updated_at", &now_utc_string())?;

    Ok(())
}

fn upsert_metadata(connection: &Connection, key: &str, value: &str) -> Result<()> {
    connection
        .execute(
            "INSERT INTO metadata(key, value) VALUES(?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            params![key, value],
        )
        .with_context(|| format!("failed to write metadata key {key}"))?;
    Ok(())
}

/// Replaces the stored chunks of one document; re-ingesting the same input yields the same rows.
pub(super) fn replace_document(
    tx: &Transaction<'_>,
    entry: &DocumentEntry,
    identity: &StandardIdentity,
    page_count: usize,
    chunks: &[Chunk],
) -> Result<usize> {
    let doc_id = entry.doc_id();

    tx.execute(
        "
        INSERT INTO docs(doc_id, filename, sha256, standard_no, standard_name, page_count, chunk_count, ingested_at)
        VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(doc_id) DO UPDATE SET
          filename=excluded.filename,
          sha256=excluded.sha256,
          standard_no=excluded.standard_no,
          standard_name=excluded.standard_name,
          page_count=excluded.page_count,
          chunk_count=excluded.chunk_count,
          ingested_at=excluded.ingested_at
        ",
        params![
            doc_id,
            &entry.filename,
            &entry.sha256,
            &identity.standard_no,
            &identity.standard_name,
            page_count as i64,
            chunks.len() as i64,
            now_utc_string(),
        ],
    )
    .with_context(|| format!("failed to upsert document {doc_id}"))?;

    tx.execute("DELETE FROM chunks WHERE doc_id = ?1", [&doc_id])
        .with_context(|| format!("failed to clear chunks for {doc_id}"))?;

    let mut statement = tx.prepare(
        "
        INSERT INTO chunks(
          chunk_id, doc_id, chunk_seq, standard_no, standard_name, main_section,
          heading_path, page_start, page_end, content, source_hash
        )
        VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        ",
    )?;

    for (chunk_seq, chunk) in chunks.iter().enumerate() {
        let heading_path = serde_json::to_string(&chunk.heading_path)
            .context("failed to serialize heading path")?;

        statement
            .execute(params![
                chunk_record_id(&doc_id, chunk_seq),
                doc_id,
                chunk_seq as i64,
                &chunk.standard_no,
                &chunk.standard_name,
                &chunk.main_section,
                heading_path,
                chunk.page_start,
                chunk.page_end,
                &chunk.content,
                sha256_text(&chunk.content),
            ])
            .with_context(|| format!("failed to insert chunk {chunk_seq} of {doc_id}"))?;
    }

    Ok(chunks.len())
}

pub(super) fn sync_fts_index(connection: &Connection) -> Result<()> {
    connection
        .execute("INSERT INTO chunks_fts(chunks_fts) VALUES('rebuild')", [])
        .context("failed to rebuild FTS index")?;
    Ok(())
}

pub(super) fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}
