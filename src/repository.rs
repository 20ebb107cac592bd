//! Projects, documents, and the ingestion pipeline.
//!
//! The [`ProjectRepository`] owns the relational side of Study Desk:
//!
//! ```text
//! add_document ──▶ documents row + <project>/documents/<file>
//!        │
//!        ▼
//!     ingest ──▶ extract pages ──▶ chunk ──▶ embed (document intent) ──▶ put_batch
//! ```
//!
//! Documents are identified by the SHA-256 of their bytes: uploading the
//! same content twice to a project is a no-op. A row and its file are
//! written together; if either side fails, neither is left behind.
//!
//! [`sync_from_filesystem`](ProjectRepository::sync_from_filesystem)
//! reconciles the database with a directory tree laid out as
//! `<base>/<project>/documents/<file>.pdf`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tokio::io::AsyncWriteExt;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;
use walkdir::WalkDir;

use studydesk_core::chunk::{chunk_pages, DEFAULT_WINDOW_WORDS};
use studydesk_core::embedding::{EmbeddingIntent, EmbeddingProvider};
use studydesk_core::models::{content_hash, Document, NewChunk, Project};
use studydesk_core::store::VectorStore;
use studydesk_core::{RagError, Result};

use crate::extract::TextExtractor;
use crate::sqlite_store::{db_err, unique_violation, SqliteStore};

/// Subdirectories created for every new project.
pub const DOCUMENTS_DIR: &str = "documents";
pub const MINDMAPS_DIR: &str = "mindmaps";
pub const QUIZZES_DIR: &str = "quizzes";

/// Result of [`ProjectRepository::ingest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Chunks were embedded and stored.
    Ingested { chunks: usize },
    /// The document already had chunks; nothing was embedded.
    AlreadyIngested { chunks: usize },
    /// Extraction produced no words (and OCR found nothing).
    NoText,
}

/// Counts from one [`ProjectRepository::sync_from_filesystem`] pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub projects_created: usize,
    pub documents_registered: usize,
    pub documents_ingested: usize,
    /// Files whose content is already tracked under another name.
    pub duplicates_skipped: usize,
    /// `(path, error)` for every file or project that could not be processed.
    pub failures: Vec<(String, String)>,
}

/// Check that `name` can be used as a single path component.
pub fn validate_name(kind: &str, name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RagError::InvalidInput(format!("{} name must not be empty", kind)));
    }
    if trimmed != name {
        return Err(RagError::InvalidInput(format!(
            "{} name must not start or end with whitespace: {:?}",
            kind, name
        )));
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) || name.contains('\0') {
        return Err(RagError::InvalidInput(format!(
            "{} name must be a plain file name: {:?}",
            kind, name
        )));
    }
    Ok(())
}

fn row_to_project(row: &SqliteRow) -> Project {
    Project {
        id: row.get("id"),
        name: row.get("name"),
        path: row.get("path"),
        created_at: row.get("created_at"),
    }
}

fn row_to_document(row: &SqliteRow) -> Document {
    Document {
        id: row.get("id"),
        project_id: row.get("project_id"),
        file_name: row.get("file_name"),
        file_hash: row.get("file_hash"),
    }
}

fn document_globs(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .literal_separator(true)
            .build()
            .map_err(|e| RagError::InvalidInput(format!("invalid glob {:?}: {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| RagError::InvalidInput(format!("invalid glob set: {}", e)))
}

/// Create `path` exclusively and write `bytes`. Fails with `AlreadyExists` if it is taken.
async fn write_new_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    let written = async {
        file.write_all(bytes).await?;
        file.flush().await
    }
    .await;
    if written.is_err() {
        drop(file);
        let _ = tokio::fs::remove_file(path).await;
    }
    written
}

/// Remove a file, treating "already gone" as success. Returns whether it existed.
async fn remove_file_if_present(path: &Path) -> Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "file already missing, removing record only");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// Project and document persistence plus the ingestion pipeline.
pub struct ProjectRepository {
    pool: SqlitePool,
    store: Arc<SqliteStore>,
    extractor: Arc<dyn TextExtractor>,
    embedder: Arc<dyn EmbeddingProvider>,
    window_words: usize,
    document_globs: GlobSet,
}

impl ProjectRepository {
    pub fn new(
        pool: SqlitePool,
        extractor: Arc<dyn TextExtractor>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        Ok(Self {
            store: Arc::new(SqliteStore::new(pool.clone())),
            pool,
            extractor,
            embedder,
            window_words: DEFAULT_WINDOW_WORDS,
            document_globs: document_globs(&["*.pdf".to_string()])?,
        })
    }

    /// Words per chunk used by [`ingest`](Self::ingest).
    pub fn with_window_words(mut self, window_words: usize) -> Self {
        self.window_words = window_words.max(1);
        self
    }

    /// File-name globs (case-insensitive) picked up by sync.
    pub fn with_document_globs(mut self, patterns: &[String]) -> Result<Self> {
        self.document_globs = document_globs(patterns)?;
        Ok(self)
    }

    /// The chunk store sharing this repository's database.
    pub fn store(&self) -> Arc<SqliteStore> {
        self.store.clone()
    }

    /// The provider used to embed document chunks.
    pub fn embedder(&self) -> Arc<dyn EmbeddingProvider> {
        self.embedder.clone()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ============ Projects ============

    /// Register a project stored at `path`. Names are unique.
    pub async fn create_project(&self, name: &str, path: &Path) -> Result<String> {
        validate_name("project", name)?;
        let id = Uuid::new_v4().to_string();
        self.insert_project(&self.pool, &id, name, path).await?;
        tracing::info!(project = name, path = %path.display(), "created project");
        Ok(id)
    }

    /// Create a project at `<base_dir>/<name>` with its standard subdirectories.
    pub async fn create_project_in(&self, base_dir: &Path, name: &str) -> Result<Project> {
        validate_name("project", name)?;
        let path = base_dir.join(name);
        let id = Uuid::new_v4().to_string();

        let mut tx = self.pool.begin().await.map_err(db_err)?;
        self.insert_project(&mut *tx, &id, name, &path).await?;
        for dir in [DOCUMENTS_DIR, MINDMAPS_DIR, QUIZZES_DIR] {
            tokio::fs::create_dir_all(path.join(dir)).await?;
        }
        tx.commit().await.map_err(db_err)?;

        tracing::info!(project = name, path = %path.display(), "created project");
        self.get_project(&id).await
    }

    async fn insert_project<'e, E>(&self, executor: E, id: &str, name: &str, path: &Path) -> Result<()>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        sqlx::query("INSERT INTO projects (id, name, path, created_at) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(path.to_string_lossy().into_owned())
            .bind(chrono::Utc::now().timestamp())
            .execute(executor)
            .await
            .map_err(|e| {
                if unique_violation(&e).is_some() {
                    RagError::DuplicateProjectName(name.to_string())
                } else {
                    db_err(e)
                }
            })?;
        Ok(())
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        let rows = sqlx::query("SELECT id, name, path, created_at FROM projects ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.iter().map(row_to_project).collect())
    }

    pub async fn get_project(&self, project_id: &str) -> Result<Project> {
        sqlx::query("SELECT id, name, path, created_at FROM projects WHERE id = ?")
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| row_to_project(&row))
            .ok_or_else(|| RagError::not_found("project", project_id))
    }

    pub async fn find_project_by_name(&self, name: &str) -> Result<Option<Project>> {
        let row = sqlx::query("SELECT id, name, path, created_at FROM projects WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(|r| row_to_project(&r)))
    }

    /// Delete a project, its documents, their chunks, and the documents' files.
    ///
    /// The project directory itself is left in place, so generated mind maps
    /// and quizzes survive.
    pub async fn delete_project(&self, project_id: &str) -> Result<()> {
        let project = self.get_project(project_id).await?;
        let documents = self.list_documents(project_id).await?;

        sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(project_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        for doc in &documents {
            let path = self.file_path(&project, &doc.file_name);
            if let Err(e) = remove_file_if_present(&path).await {
                tracing::warn!(path = %path.display(), error = %e, "could not remove document file");
            }
        }
        tracing::info!(project = %project.name, documents = documents.len(), "deleted project");
        Ok(())
    }

    // ============ Documents ============

    pub async fn list_documents(&self, project_id: &str) -> Result<Vec<Document>> {
        let rows = sqlx::query(
            "SELECT id, project_id, file_name, file_hash FROM documents WHERE project_id = ? ORDER BY file_name ASC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.iter().map(row_to_document).collect())
    }

    pub async fn get_document(&self, document_id: &str) -> Result<Document> {
        sqlx::query("SELECT id, project_id, file_name, file_hash FROM documents WHERE id = ?")
            .bind(document_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| row_to_document(&row))
            .ok_or_else(|| RagError::not_found("document", document_id))
    }

    pub async fn find_document_by_name(
        &self,
        project_id: &str,
        file_name: &str,
    ) -> Result<Option<Document>> {
        let row = sqlx::query(
            "SELECT id, project_id, file_name, file_hash FROM documents WHERE project_id = ? AND file_name = ?",
        )
        .bind(project_id)
        .bind(file_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(|r| row_to_document(&r)))
    }

    async fn find_document_by_hash(&self, project_id: &str, file_hash: &str) -> Result<Option<Document>> {
        let row = sqlx::query(
            "SELECT id, project_id, file_name, file_hash FROM documents WHERE project_id = ? AND file_hash = ?",
        )
        .bind(project_id)
        .bind(file_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(|r| row_to_document(&r)))
    }

    fn file_path(&self, project: &Project, file_name: &str) -> PathBuf {
        Path::new(&project.path).join(DOCUMENTS_DIR).join(file_name)
    }

    /// On-disk location of a document's file.
    pub async fn document_path(&self, document: &Document) -> Result<PathBuf> {
        let project = self.get_project(&document.project_id).await?;
        Ok(self.file_path(&project, &document.file_name))
    }

    /// Store an uploaded file and register it.
    ///
    /// Returns `None` without writing anything when the project already holds
    /// a document with identical bytes. A different file under an existing
    /// name fails with [`RagError::DuplicateFileName`], including an
    /// untracked file already sitting in the documents directory.
    pub async fn add_document(
        &self,
        project_id: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<Option<String>> {
        validate_name("file", file_name)?;
        let project = self.get_project(project_id).await?;
        let file_hash = content_hash(bytes);

        if let Some(existing) = self.find_document_by_hash(project_id, &file_hash).await? {
            tracing::info!(
                file = file_name,
                existing = %existing.file_name,
                "identical content already in project, skipping upload"
            );
            return Ok(None);
        }

        let path = self.file_path(&project, file_name);
        let id = Uuid::new_v4().to_string();

        let mut tx = self.pool.begin().await.map_err(db_err)?;
        if !self
            .insert_document(&mut *tx, &id, project_id, file_name, &file_hash)
            .await?
        {
            return Ok(None);
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Never overwrite a file that is on disk but not tracked yet.
        let wrote = match write_new_file(&path, bytes).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let on_disk = tokio::fs::read(&path).await?;
                if content_hash(&on_disk) != file_hash {
                    tracing::warn!(
                        path = %path.display(),
                        "untracked file with different content already on disk, leaving it alone"
                    );
                    return Err(RagError::DuplicateFileName {
                        project_id: project_id.to_string(),
                        file_name: file_name.to_string(),
                    });
                }
                tracing::info!(path = %path.display(), "identical untracked file already on disk, registering it");
                false
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = tx.commit().await {
            if wrote {
                if let Err(rm) = tokio::fs::remove_file(&path).await {
                    tracing::warn!(path = %path.display(), error = %rm, "could not clean up file after failed commit");
                }
            }
            return Err(db_err(e));
        }

        tracing::info!(project = %project.name, file = file_name, document_id = %id, "added document");
        Ok(Some(id))
    }

    /// Insert a documents row. Returns `false` if the same content raced in first.
    async fn insert_document<'e, E>(
        &self,
        executor: E,
        id: &str,
        project_id: &str,
        file_name: &str,
        file_hash: &str,
    ) -> Result<bool>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let result = sqlx::query(
            "INSERT INTO documents (id, project_id, file_name, file_hash, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(project_id)
        .bind(file_name)
        .bind(file_hash)
        .bind(chrono::Utc::now().timestamp())
        .execute(executor)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) => match unique_violation(&e) {
                Some(msg) if msg.contains("file_hash") => Ok(false),
                Some(_) => Err(RagError::DuplicateFileName {
                    project_id: project_id.to_string(),
                    file_name: file_name.to_string(),
                }),
                None => Err(db_err(e)),
            },
        }
    }

    /// Register a file that already sits in the project's documents directory.
    async fn register_existing(&self, project: &Project, file_name: &str) -> Result<Option<String>> {
        let bytes = tokio::fs::read(self.file_path(project, file_name)).await?;
        let file_hash = content_hash(&bytes);
        if let Some(existing) = self.find_document_by_hash(&project.id, &file_hash).await? {
            tracing::info!(
                file = file_name,
                existing = %existing.file_name,
                "identical content already tracked, skipping"
            );
            return Ok(None);
        }
        let id = Uuid::new_v4().to_string();
        if self
            .insert_document(&self.pool, &id, &project.id, file_name, &file_hash)
            .await?
        {
            Ok(Some(id))
        } else {
            Ok(None)
        }
    }

    /// Extract, chunk, embed, and store a document's text.
    ///
    /// A document that already has chunks is left alone without calling the
    /// embedding service. A missing file fails with [`RagError::NotFound`].
    pub async fn ingest(&self, project_id: &str, document_id: &str) -> Result<IngestOutcome> {
        let document = self.get_document(document_id).await?;
        if document.project_id != project_id {
            return Err(RagError::not_found("document", document_id));
        }

        let existing = self.store.chunk_count(document_id).await?;
        if existing > 0 {
            tracing::debug!(document_id, chunks = existing, "already ingested");
            return Ok(IngestOutcome::AlreadyIngested { chunks: existing });
        }

        let path = self.document_path(&document).await?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RagError::not_found("file", path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let extractor = self.extractor.clone();
        let pages = tokio::task::spawn_blocking(move || extractor.extract_pages(&bytes))
            .await
            .map_err(|e| RagError::Extraction(format!("extraction task failed: {}", e)))??;

        let drafts = chunk_pages(&pages, self.window_words);
        if drafts.is_empty() {
            tracing::warn!(file = %document.file_name, pages = pages.len(), "no text extracted");
            self.mark_processed(document_id).await?;
            return Ok(IngestOutcome::NoText);
        }
        tracing::info!(
            file = %document.file_name,
            pages = pages.len(),
            chunks = drafts.len(),
            "chunked document"
        );

        let texts: Vec<String> = drafts.iter().map(|d| d.text.clone()).collect();
        let vectors = self
            .embedder
            .embed_many(&texts, EmbeddingIntent::Document)
            .await?;

        let chunks: Vec<NewChunk> = drafts
            .into_iter()
            .zip(vectors)
            .map(|(draft, vector)| NewChunk::from_draft(draft, vector))
            .collect();

        match self.store.put_batch(document_id, &chunks).await {
            Ok(ids) => {
                self.mark_processed(document_id).await?;
                Ok(IngestOutcome::Ingested { chunks: ids.len() })
            }
            Err(RagError::DuplicateChunk { .. }) => {
                let chunks = self.store.chunk_count(document_id).await?;
                tracing::info!(document_id, chunks, "ingested concurrently, keeping existing chunks");
                Ok(IngestOutcome::AlreadyIngested { chunks })
            }
            Err(e) => Err(e),
        }
    }

    /// Record that extraction ran to completion, even if it found no text.
    async fn mark_processed(&self, document_id: &str) -> Result<()> {
        sqlx::query("UPDATE documents SET processed_at = ? WHERE id = ?")
            .bind(chrono::Utc::now().timestamp())
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn is_processed(&self, document_id: &str) -> Result<bool> {
        let processed_at =
            sqlx::query_scalar::<_, Option<i64>>("SELECT processed_at FROM documents WHERE id = ?")
                .bind(document_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?
                .flatten();
        Ok(processed_at.is_some())
    }

    /// Upload and immediately ingest. `None` means identical content already existed.
    pub async fn add_and_ingest(
        &self,
        project_id: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<Option<(String, IngestOutcome)>> {
        let Some(document_id) = self.add_document(project_id, file_name, bytes).await? else {
            return Ok(None);
        };
        let outcome = self.ingest(project_id, &document_id).await?;
        Ok(Some((document_id, outcome)))
    }

    /// Remove a document's row, its chunks, and its file.
    ///
    /// A file that is already gone is logged and ignored.
    pub async fn delete_document(&self, document_id: &str) -> Result<()> {
        let document = self.get_document(document_id).await?;
        let path = self.document_path(&document).await?;

        let mut tx = self.pool.begin().await.map_err(db_err)?;
        sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        remove_file_if_present(&path).await?;

        tracing::info!(file = %document.file_name, document_id, "deleted document");
        Ok(())
    }

    // ============ Filesystem sync ============

    /// Converge the database with `<base_dir>/<project>/documents/*`.
    ///
    /// Unknown project directories are registered, untracked documents are
    /// registered and ingested, and tracked documents whose extraction never
    /// completed are ingested again. Documents that yielded no text are not
    /// re-extracted; call [`ingest`](Self::ingest) to retry one. Running it twice on an unchanged tree registers
    /// nothing the second time. Failures on individual files are collected
    /// in the report instead of aborting the pass.
    pub async fn sync_from_filesystem(&self, base_dir: &Path) -> Result<SyncReport> {
        let mut report = SyncReport::default();
        if !base_dir.is_dir() {
            tracing::warn!(path = %base_dir.display(), "projects directory does not exist, nothing to sync");
            return Ok(report);
        }

        let project_dirs = WalkDir::new(base_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(e) if e.file_type().is_dir() => Some(e),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable entry");
                    None
                }
            });

        for entry in project_dirs {
            let dir = entry.path();
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                report
                    .failures
                    .push((dir.display().to_string(), "project name is not valid UTF-8".to_string()));
                continue;
            };

            let project = match self.find_project_by_name(&name).await? {
                Some(p) if Path::new(&p.path) != dir => {
                    tracing::warn!(project = %name, known_path = %p.path, "name belongs to a project stored elsewhere, skipping");
                    report.failures.push((
                        dir.display().to_string(),
                        format!("project '{}' is registered at {}", name, p.path),
                    ));
                    continue;
                }
                Some(p) => p,
                None => match self.create_project(&name, dir).await {
                    Ok(id) => {
                        report.projects_created += 1;
                        self.get_project(&id).await?
                    }
                    Err(e) => {
                        report.failures.push((dir.display().to_string(), e.to_string()));
                        continue;
                    }
                },
            };

            self.sync_project_documents(&project, &mut report).await?;
        }

        tracing::info!(
            projects_created = report.projects_created,
            documents_registered = report.documents_registered,
            documents_ingested = report.documents_ingested,
            failures = report.failures.len(),
            "sync finished"
        );
        Ok(report)
    }

    async fn sync_project_documents(&self, project: &Project, report: &mut SyncReport) -> Result<()> {
        let documents_dir = Path::new(&project.path).join(DOCUMENTS_DIR);
        if !documents_dir.is_dir() {
            return Ok(());
        }

        let files: Vec<String> = WalkDir::new(&documents_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .filter(|name| self.document_globs.is_match(name))
            .collect();

        for file_name in files {
            let file_path = documents_dir.join(&file_name).display().to_string();

            let document_id = match self.find_document_by_name(&project.id, &file_name).await? {
                Some(doc) => {
                    let done = self.store.chunk_count(&doc.id).await? > 0
                        || self.is_processed(&doc.id).await?;
                    if done {
                        continue;
                    }
                    doc.id
                }
                None => match self.register_existing(project, &file_name).await {
                    Ok(Some(id)) => {
                        report.documents_registered += 1;
                        id
                    }
                    Ok(None) => {
                        report.duplicates_skipped += 1;
                        continue;
                    }
                    Err(e) => {
                        report.failures.push((file_path, e.to_string()));
                        continue;
                    }
                },
            };

            match self.ingest(&project.id, &document_id).await {
                Ok(IngestOutcome::Ingested { .. }) => report.documents_ingested += 1,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(file = %file_path, error = %e, "ingest failed");
                    report.failures.push((file_path, e.to_string()));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("project", "Biology 101").is_ok());
        assert!(validate_name("file", "notes.pdf").is_ok());
        for bad in ["", "  ", ".", "..", "a/b", "a\\b", " padded"] {
            assert!(
                matches!(validate_name("file", bad), Err(RagError::InvalidInput(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_document_globs_case_insensitive() {
        let globs = document_globs(&["*.pdf".to_string()]).unwrap();
        assert!(globs.is_match("notes.pdf"));
        assert!(globs.is_match("SCAN.PDF"));
        assert!(!globs.is_match("notes.txt"));
        assert!(!globs.is_match("sub/notes.pdf"));
    }
}
