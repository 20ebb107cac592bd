//! SQLite-backed [`VectorStore`] implementation.
//!
//! Chunks live in `text_chunks` with their embedding stored as a
//! little-endian f32 BLOB. Search is a full scan of the project's chunks
//! (joined through `documents.project_id`) scored in process with
//! [`cosine_similarity`].

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use studydesk_core::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use studydesk_core::models::{NewChunk, ScoredChunk, TextChunk};
use studydesk_core::store::{rank, validate_chunk, VectorStore};
use studydesk_core::{RagError, Result};

/// SQLite implementation of the [`VectorStore`] trait.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Wrap a database error that has no more specific meaning.
pub(crate) fn db_err(e: sqlx::Error) -> RagError {
    RagError::Storage(e.to_string())
}

/// The constraint message of a UNIQUE violation, e.g.
/// `UNIQUE constraint failed: documents.project_id, documents.file_name`.
pub(crate) fn unique_violation(e: &sqlx::Error) -> Option<String> {
    e.as_database_error()
        .filter(|d| d.is_unique_violation())
        .map(|d| d.message().to_string())
}

pub(crate) fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|d| d.is_foreign_key_violation())
}

fn insert_error(e: sqlx::Error, document_id: &str, chunk_index: i64) -> RagError {
    if unique_violation(&e).is_some() {
        RagError::DuplicateChunk {
            document_id: document_id.to_string(),
            chunk_index,
        }
    } else if is_foreign_key_violation(&e) {
        RagError::not_found("document", document_id)
    } else {
        db_err(e)
    }
}

async fn insert_chunk<'e, E>(executor: E, document_id: &str, chunk: &NewChunk) -> Result<String>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    validate_chunk(chunk)?;
    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO text_chunks (id, document_id, text, page_number, chunk_index, vector)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(document_id)
    .bind(&chunk.text)
    .bind(chunk.page_number)
    .bind(chunk.chunk_index)
    .bind(vec_to_blob(&chunk.vector))
    .execute(executor)
    .await
    .map_err(|e| insert_error(e, document_id, chunk.chunk_index))?;
    Ok(id)
}

fn row_to_chunk(row: &SqliteRow) -> TextChunk {
    let blob: Vec<u8> = row.get("vector");
    TextChunk {
        id: row.get("id"),
        document_id: row.get("document_id"),
        text: row.get("text"),
        page_number: row.get("page_number"),
        chunk_index: row.get("chunk_index"),
        vector: blob_to_vec(&blob),
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn put(&self, document_id: &str, chunk: &NewChunk) -> Result<String> {
        insert_chunk(&self.pool, document_id, chunk).await
    }

    async fn put_batch(&self, document_id: &str, chunks: &[NewChunk]) -> Result<Vec<String>> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut ids = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            ids.push(insert_chunk(&mut *tx, document_id, chunk).await?);
        }
        tx.commit().await.map_err(db_err)?;
        Ok(ids)
    }

    async fn search(
        &self,
        project_id: &str,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT tc.id, tc.document_id, tc.text, tc.page_number, tc.chunk_index, tc.vector
            FROM text_chunks tc
            JOIN documents d ON d.id = tc.document_id
            WHERE d.project_id = ?
            ORDER BY tc.document_id, tc.chunk_index
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let candidates = rows
            .iter()
            .map(|row| {
                let chunk = row_to_chunk(row);
                ScoredChunk {
                    score: cosine_similarity(query_vector, &chunk.vector),
                    chunk_id: chunk.id,
                    document_id: chunk.document_id,
                    text: chunk.text,
                    page_number: chunk.page_number,
                    chunk_index: chunk.chunk_index,
                    vector: chunk.vector,
                }
            })
            .collect();

        Ok(rank(candidates, top_k))
    }

    async fn chunk_count(&self, document_id: &str) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM text_chunks WHERE document_id = ?")
            .bind(document_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(count as usize)
    }

    async fn document_chunks(&self, document_id: &str) -> Result<Vec<TextChunk>> {
        let rows = sqlx::query(
            r#"
            SELECT id, document_id, text, page_number, chunk_index, vector
            FROM text_chunks
            WHERE document_id = ?
            ORDER BY chunk_index ASC
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.iter().map(row_to_chunk).collect())
    }
}
