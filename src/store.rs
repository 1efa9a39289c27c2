use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use crate::processor::Chunk;
use crate::util::ensure_directory;

pub const STORE_SCHEMA_VERSION: &str = "0.1.0";

#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub file_name: String,
    pub file_path: String,
    pub sha256: String,
    pub title: String,
    pub n_page: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    pub file_name: String,
    pub title: String,
    pub n_page: i64,
    pub n_chunk: i64,
    pub ingested_at: String,
}

pub fn open_store(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        ensure_directory(parent)?;
    }

    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    Ok(connection)
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS docs (
          file_name TEXT PRIMARY KEY,
          file_path TEXT NOT NULL,
          sha256 TEXT NOT NULL,
          title TEXT NOT NULL,
          n_page INTEGER NOT NULL,
          n_chunk INTEGER NOT NULL,
          ingested_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS chunks (
          file_name TEXT NOT NULL,
          i_chunk_on_doc INTEGER NOT NULL,
          text TEXT NOT NULL,
          n_char INTEGER NOT NULL,
          n_word INTEGER NOT NULL,
          i_page INTEGER NOT NULL,
          i_chunk_on_page INTEGER NOT NULL,
          n_chunk_of_page INTEGER NOT NULL,
          n_chunk_of_doc INTEGER NOT NULL,
          n_page INTEGER NOT NULL,
          name TEXT NOT NULL,
          file_path TEXT NOT NULL,
          reg_date TEXT NOT NULL,
          PRIMARY KEY (file_name, i_chunk_on_doc)
        );

        CREATE INDEX IF NOT EXISTS idx_chunks_name ON chunks(name);
        ",
        )
        .context("failed to create store schema")?;

    connection
        .execute(
            "INSERT INTO metadata(key, value) VALUES('schema_version', ?1)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            [STORE_SCHEMA_VERSION],
        )
        .context("failed to record store schema version")?;

    Ok(())
}

pub fn replace_document_chunks(
    connection: &mut Connection,
    document: &DocumentRecord,
    chunks: &[Chunk],
    ingested_at: &str,
) -> Result<usize> {
    let tx = connection.transaction()?;
    tx.execute(
        "DELETE FROM chunks WHERE file_name = ?1",
        [&document.file_name],
    )?;

    {
        let mut statement = tx.prepare(
            "
            INSERT INTO chunks(
              file_name, i_chunk_on_doc, text, n_char, n_word, i_page,
              i_chunk_on_page, n_chunk_of_page, n_chunk_of_doc, n_page,
              name, file_path, reg_date
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ",
        )?;

        for chunk in chunks {
            statement.execute(params![
                &document.file_name,
                chunk.i_chunk_on_doc as i64,
                &chunk.text,
                chunk.n_char as i64,
                chunk.n_word as i64,
                chunk.i_page,
                chunk.i_chunk_on_page as i64,
                chunk.n_chunk_of_page as i64,
                chunk.n_chunk_of_doc as i64,
                chunk.n_page as i64,
                &chunk.name,
                &chunk.file_path,
                &chunk.reg_date,
            ])?;
        }
    }

    tx.execute(
        "
        INSERT INTO docs(file_name, file_path, sha256, title, n_page, n_chunk, ingested_at)
        VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(file_name) DO UPDATE SET
          file_path=excluded.file_path,
          sha256=excluded.sha256,
          title=excluded.title,
          n_page=excluded.n_page,
          n_chunk=excluded.n_chunk,
          ingested_at=excluded.ingested_at
        ",
        params![
            &document.file_name,
            &document.file_path,
            &document.sha256,
            &document.title,
            document.n_page as i64,
            chunks.len() as i64,
            ingested_at,
        ],
    )?;

    tx.commit()
        .with_context(|| format!("failed to commit chunks for {}", document.file_name))?;
    Ok(chunks.len())
}

pub fn remove_document(connection: &mut Connection, file_name: &str) -> Result<usize> {
    let tx = connection.transaction()?;
    let removed = tx.execute("DELETE FROM chunks WHERE file_name = ?1", [file_name])?;
    tx.execute("DELETE FROM docs WHERE file_name = ?1", [file_name])?;
    tx.commit()
        .with_context(|| format!("failed to remove {file_name}"))?;
    Ok(removed)
}

pub fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}

pub fn document_summaries(connection: &Connection) -> Result<Vec<DocumentSummary>> {
    let mut statement = connection.prepare(
        "
        SELECT file_name, title, n_page, n_chunk, ingested_at
        FROM docs
        ORDER BY file_name ASC
        ",
    )?;

    let mut rows = statement.query([])?;
    let mut out = Vec::<DocumentSummary>::new();
    while let Some(row) = rows.next()? {
        out.push(DocumentSummary {
            file_name: row.get(0)?,
            title: row.get(1)?,
            n_page: row.get(2)?,
            n_chunk: row.get(3)?,
            ingested_at: row.get(4)?,
        });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_chunk(index: usize, total: usize) -> Chunk {
        Chunk {
            text: format!("[개인정보 보호법] [제{index}조] 본문 {index}"),
            n_char: 20,
            n_word: 4,
            i_page: 1,
            i_chunk_on_page: index,
            n_chunk_of_page: total,
            i_chunk_on_doc: index,
            n_chunk_of_doc: total,
            n_page: 3,
            name: format!("개인정보보호법제{index}조"),
            file_path: "/pdfs/privacy.pdf".to_string(),
            file_name: "privacy.pdf".to_string(),
            reg_date: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn record() -> DocumentRecord {
        DocumentRecord {
            file_name: "privacy.pdf".to_string(),
            file_path: "/pdfs/privacy.pdf".to_string(),
            sha256: "abc".to_string(),
            title: "개인정보 보호법".to_string(),
            n_page: 3,
        }
    }

    fn memory_store() -> Connection {
        let connection = Connection::open_in_memory().expect("in-memory sqlite");
        ensure_schema(&connection).expect("schema");
        connection
    }

    #[test]
    fn replace_document_chunks_overwrites_previous_ingest() {
        let mut connection = memory_store();
        let first = (1..=3).map(|index| sample_chunk(index, 3)).collect::<Vec<_>>();
        let second = (1..=2).map(|index| sample_chunk(index, 2)).collect::<Vec<_>>();

        replace_document_chunks(&mut connection, &record(), &first, "t1").expect("first insert");
        let inserted =
            replace_document_chunks(&mut connection, &record(), &second, "t2").expect("second insert");

        assert_eq!(inserted, 2);
        assert_eq!(
            count_rows(&connection, "SELECT COUNT(*) FROM chunks").expect("count"),
            2
        );

        let summaries = document_summaries(&connection).expect("summaries");
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].n_chunk, 2);
        assert_eq!(summaries[0].ingested_at, "t2");
    }

    #[test]
    fn remove_document_deletes_chunks_and_doc_row() {
        let mut connection = memory_store();
        let chunks = (1..=3).map(|index| sample_chunk(index, 3)).collect::<Vec<_>>();
        replace_document_chunks(&mut connection, &record(), &chunks, "t1").expect("insert");

        let removed = remove_document(&mut connection, "privacy.pdf").expect("remove");

        assert_eq!(removed, 3);
        assert_eq!(
            count_rows(&connection, "SELECT COUNT(*) FROM docs").expect("count"),
            0
        );
    }
}
