//! CLI command implementations.
//!
//! Each `run_*` function backs one `studydesk` subcommand: it opens the
//! database, calls into the library, and prints results to stdout.
//! Library errors bubble up as `anyhow` errors with context.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use studydesk_core::embedding::EmbeddingProvider;
use studydesk_core::models::Project;
use studydesk_core::retrieval::RetrievalEngine;
use studydesk_core::store::VectorStore;

use crate::completion::create_completion;
use crate::config::Config;
use crate::embedding::create_provider;
use crate::extract::PdfExtractor;
use crate::repository::{IngestOutcome, ProjectRepository};
use crate::stats::format_ts_iso;
use crate::study::{Answer, StudyService};
use crate::{db, migrate};

/// Wired-up services for one command invocation.
pub struct App {
    pub config: Config,
    pub repo: ProjectRepository,
    /// The provider the repository ingests with; retrieval embeds queries with it too.
    pub embedder: Arc<dyn EmbeddingProvider>,
}

impl App {
    /// Connect to the database, apply migrations, and build the repository.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::apply(&pool).await?;

        let embedder = create_provider(&config.embedding)?;
        let extractor = Arc::new(PdfExtractor::new(&config.ocr));
        let repo = ProjectRepository::new(pool, extractor, embedder.clone())?
            .with_window_words(config.chunking.window_words)
            .with_document_globs(&config.sync.document_globs)?;

        Ok(Self {
            config: config.clone(),
            repo,
            embedder,
        })
    }

    pub fn retrieval_engine(&self) -> Result<RetrievalEngine> {
        Ok(RetrievalEngine::new(self.repo.store(), self.embedder.clone())
            .with_min_similarity(self.config.retrieval.min_similarity))
    }

    pub fn study_service(&self) -> Result<StudyService> {
        let completion = create_completion(&self.config.completion)?;
        Ok(StudyService::new(
            self.retrieval_engine()?,
            completion,
            self.config.retrieval.top_k,
        ))
    }

    pub async fn project(&self, name: &str) -> Result<Project> {
        match self.repo.find_project_by_name(name).await? {
            Some(p) => Ok(p),
            None => bail!("No project named '{}'. Create it with `studydesk project create`.", name),
        }
    }

    pub async fn close(self) {
        self.repo.pool().close().await;
    }
}

// ============ Projects ============

pub async fn run_project_create(config: &Config, name: &str) -> Result<()> {
    let app = App::open(config).await?;
    let project = app
        .repo
        .create_project_in(&config.storage.projects_dir, name)
        .await?;
    println!("Created project '{}' at {}", project.name, project.path);
    app.close().await;
    Ok(())
}

pub async fn run_project_list(config: &Config) -> Result<()> {
    let app = App::open(config).await?;
    let projects = app.repo.list_projects().await?;
    if projects.is_empty() {
        println!("No projects.");
    }
    for p in &projects {
        let docs = app.repo.list_documents(&p.id).await?.len();
        println!(
            "{:<28} {:>4} docs   {}   {}",
            p.name,
            docs,
            format_ts_iso(p.created_at),
            p.path
        );
    }
    app.close().await;
    Ok(())
}

pub async fn run_project_delete(config: &Config, name: &str) -> Result<()> {
    let app = App::open(config).await?;
    let project = app.project(name).await?;
    app.repo.delete_project(&project.id).await?;
    println!("Deleted project '{}'", name);
    app.close().await;
    Ok(())
}

// ============ Documents ============

fn describe(outcome: IngestOutcome) -> String {
    match outcome {
        IngestOutcome::Ingested { chunks } => format!("ingested {} chunks", chunks),
        IngestOutcome::AlreadyIngested { chunks } => format!("already ingested ({} chunks)", chunks),
        IngestOutcome::NoText => "no text could be extracted".to_string(),
    }
}

pub async fn run_doc_add(config: &Config, project: &str, file: &Path) -> Result<()> {
    let app = App::open(config).await?;
    let project = app.project(project).await?;

    let bytes = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Not a file name: {}", file.display()))?;

    match app.repo.add_document(&project.id, file_name, &bytes).await? {
        None => println!("'{}' is already in project '{}' (identical content).", file_name, project.name),
        Some(document_id) => {
            println!("Added '{}' ({})", file_name, document_id);
            let outcome = app
                .repo
                .ingest(&project.id, &document_id)
                .await
                .with_context(|| {
                    format!(
                        "Stored '{}' but ingestion failed; retry with `studydesk doc ingest`",
                        file_name
                    )
                })?;
            println!("  {}", describe(outcome));
        }
    }
    app.close().await;
    Ok(())
}

pub async fn run_doc_list(config: &Config, project: &str) -> Result<()> {
    let app = App::open(config).await?;
    let project = app.project(project).await?;
    let store = app.repo.store();
    let documents = app.repo.list_documents(&project.id).await?;
    if documents.is_empty() {
        println!("No documents in '{}'.", project.name);
    }
    for doc in &documents {
        let chunks = store.chunk_count(&doc.id).await?;
        println!(
            "{:<40} {:>6} chunks   {}   {}",
            doc.file_name,
            chunks,
            &doc.file_hash[..12.min(doc.file_hash.len())],
            doc.id
        );
    }
    app.close().await;
    Ok(())
}

async fn find_document(app: &App, project: &Project, file_name: &str) -> Result<String> {
    match app.repo.find_document_by_name(&project.id, file_name).await? {
        Some(doc) => Ok(doc.id),
        None => bail!("No document named '{}' in project '{}'", file_name, project.name),
    }
}

pub async fn run_doc_delete(config: &Config, project: &str, file_name: &str) -> Result<()> {
    let app = App::open(config).await?;
    let project = app.project(project).await?;
    let document_id = find_document(&app, &project, file_name).await?;
    app.repo.delete_document(&document_id).await?;
    println!("Deleted '{}'", file_name);
    app.close().await;
    Ok(())
}

pub async fn run_doc_ingest(config: &Config, project: &str, file_name: &str) -> Result<()> {
    let app = App::open(config).await?;
    let project = app.project(project).await?;
    let document_id = find_document(&app, &project, file_name).await?;
    let outcome = app.repo.ingest(&project.id, &document_id).await?;
    println!("{}: {}", file_name, describe(outcome));
    app.close().await;
    Ok(())
}

// ============ Sync ============

pub async fn run_sync(config: &Config) -> Result<()> {
    let app = App::open(config).await?;
    let report = app
        .repo
        .sync_from_filesystem(&config.storage.projects_dir)
        .await?;

    println!("sync {}", config.storage.projects_dir.display());
    println!("  projects created:      {}", report.projects_created);
    println!("  documents registered:  {}", report.documents_registered);
    println!("  documents ingested:    {}", report.documents_ingested);
    println!("  duplicates skipped:    {}", report.duplicates_skipped);
    if !report.failures.is_empty() {
        println!("  failures:              {}", report.failures.len());
        for (path, error) in &report.failures {
            println!("    {}: {}", path, error);
        }
    }
    app.close().await;
    Ok(())
}

// ============ Retrieval and study tasks ============

pub async fn run_search(config: &Config, project: &str, query: &str, top_k: Option<usize>) -> Result<()> {
    let app = App::open(config).await?;
    let project = app.project(project).await?;
    let top_k = top_k.unwrap_or(config.retrieval.top_k);

    let retrieved = app
        .retrieval_engine()?
        .retrieve_context(query, &project.id, top_k)
        .await?;

    if retrieved.is_empty() {
        println!("No results.");
    }
    for (i, hit) in retrieved.chunks.iter().enumerate() {
        let snippet: String = hit.text.chars().take(200).collect();
        println!(
            "{}. [{:.3}] page {} (chunk {})",
            i + 1,
            hit.score,
            hit.page_number,
            hit.chunk_index
        );
        println!("    {}", snippet);
        println!();
    }
    app.close().await;
    Ok(())
}

pub async fn run_ask(config: &Config, project: &str, question: &str) -> Result<()> {
    let app = App::open(config).await?;
    let project = app.project(project).await?;

    match app.study_service()?.answer_question(&project, question).await? {
        Answer::NoInformation => {
            println!("{}", studydesk_core::study::NO_INFORMATION);
        }
        Answer::Answered { text, chunks } => {
            println!("{}", text);
            println!();
            let pages: Vec<String> = chunks.iter().map(|c| c.page_number.to_string()).collect();
            println!("Sources: pages {}", pages.join(", "));
        }
    }
    app.close().await;
    Ok(())
}

pub async fn run_mindmap(config: &Config, project: &str, topic: &str) -> Result<()> {
    let app = App::open(config).await?;
    let project = app.project(project).await?;

    let saved = app.study_service()?.build_mind_map(&project, topic).await?;
    for node in &saved.value.nodes {
        println!("- {}", node.label);
    }
    println!();
    println!(
        "{} nodes, {} edges saved to {}",
        saved.value.nodes.len(),
        saved.value.edges.len(),
        saved.path.display()
    );
    app.close().await;
    Ok(())
}

pub async fn run_quiz(
    config: &Config,
    project: &str,
    topic: &str,
    questions: usize,
    difficulty: &str,
) -> Result<()> {
    let app = App::open(config).await?;
    let project = app.project(project).await?;

    let saved = app
        .study_service()?
        .generate_quiz(&project, topic, questions, difficulty)
        .await?;
    for (i, q) in saved.value.questions.iter().enumerate() {
        println!("Question {}: {}", i + 1, q.question);
        for (letter, option) in ['A', 'B', 'C', 'D'].iter().zip(&q.options) {
            println!("  {}) {}", letter, option);
        }
        println!();
    }
    println!(
        "{} questions saved to {}",
        saved.value.questions.len(),
        saved.path.display()
    );
    app.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[tokio::test]
    async fn test_app_shares_one_embedding_provider() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = parse_config(&format!(
            "[db]\npath = \"{}\"\n",
            tmp.path().join("studydesk.sqlite").display()
        ))
        .unwrap();

        let app = App::open(&config).await.unwrap();
        let repo_embedder = app.repo.embedder();
        assert!(std::ptr::addr_eq(
            Arc::as_ptr(&app.embedder),
            Arc::as_ptr(&repo_embedder)
        ));
        assert!(app.retrieval_engine().is_ok());
        app.close().await;
    }
}
