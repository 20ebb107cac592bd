//! # Study Desk CLI (`studydesk`)
//!
//! ## Usage
//!
//! ```bash
//! studydesk --config ./config/studydesk.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `studydesk init` | Create the SQLite database and run schema migrations |
//! | `studydesk project create\|list\|delete` | Manage projects |
//! | `studydesk doc add\|list\|delete\|ingest` | Manage a project's documents |
//! | `studydesk sync` | Register and ingest everything under `storage.projects_dir` |
//! | `studydesk search <project> "<query>"` | Show the chunks most similar to a query |
//! | `studydesk ask <project> "<question>"` | Answer a question from a project's documents |
//! | `studydesk mindmap <project> "<topic>"` | Generate and save a mind map |
//! | `studydesk quiz <project> "<topic>"` | Generate and save a multiple-choice quiz |
//! | `studydesk stats` | Per-project document and chunk counts |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use studydesk::{commands, config, logging, migrate, stats};

/// Study Desk: ask questions about your PDFs and turn them into study aids.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file.
#[derive(Parser)]
#[command(
    name = "studydesk",
    about = "Study Desk: ask questions about your PDFs and turn them into study aids",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/studydesk.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the projects, documents, and
    /// text_chunks tables. Safe to run repeatedly.
    Init,

    /// Manage projects.
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Manage documents within a project.
    Doc {
        #[command(subcommand)]
        action: DocAction,
    },

    /// Reconcile the database with the projects directory.
    ///
    /// Registers unknown project directories and every untracked PDF under
    /// `<project>/documents/`, then ingests them. Running it again on an
    /// unchanged tree does nothing.
    Sync,

    /// Show the chunks of a project most similar to a query.
    Search {
        project: String,
        query: String,

        /// Maximum number of chunks to return (defaults to `retrieval.top_k`).
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Answer a question using a project's documents.
    Ask { project: String, question: String },

    /// Generate a mind map for a topic and save it under `<project>/mindmaps/`.
    Mindmap { project: String, topic: String },

    /// Generate a multiple-choice quiz and save it under `<project>/quizzes/`.
    Quiz {
        project: String,
        topic: String,

        /// Number of questions.
        #[arg(long, default_value_t = 5)]
        questions: usize,

        /// Difficulty label passed to the model (e.g. Easy, Medium, Hard).
        #[arg(long, default_value = "Medium")]
        difficulty: String,
    },

    /// Show per-project document and chunk counts.
    Stats,
}

#[derive(Subcommand)]
enum ProjectAction {
    /// Create a project under `storage.projects_dir`.
    Create { name: String },
    /// List all projects.
    List,
    /// Delete a project, its documents, and their chunks.
    ///
    /// Generated mind maps and quizzes are left on disk.
    Delete { name: String },
}

#[derive(Subcommand)]
enum DocAction {
    /// Copy a PDF into a project and ingest it.
    Add { project: String, file: PathBuf },
    /// List a project's documents.
    List { project: String },
    /// Delete a document, its chunks, and its stored file.
    Delete { project: String, file_name: String },
    /// (Re)run ingestion for a stored document.
    Ingest { project: String, file_name: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    logging::init_with_config(&cfg.logging);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Project { action } => match action {
            ProjectAction::Create { name } => commands::run_project_create(&cfg, &name).await?,
            ProjectAction::List => commands::run_project_list(&cfg).await?,
            ProjectAction::Delete { name } => commands::run_project_delete(&cfg, &name).await?,
        },
        Commands::Doc { action } => match action {
            DocAction::Add { project, file } => commands::run_doc_add(&cfg, &project, &file).await?,
            DocAction::List { project } => commands::run_doc_list(&cfg, &project).await?,
            DocAction::Delete { project, file_name } => {
                commands::run_doc_delete(&cfg, &project, &file_name).await?
            }
            DocAction::Ingest { project, file_name } => {
                commands::run_doc_ingest(&cfg, &project, &file_name).await?
            }
        },
        Commands::Sync => commands::run_sync(&cfg).await?,
        Commands::Search {
            project,
            query,
            top_k,
        } => commands::run_search(&cfg, &project, &query, top_k).await?,
        Commands::Ask { project, question } => commands::run_ask(&cfg, &project, &question).await?,
        Commands::Mindmap { project, topic } => {
            commands::run_mindmap(&cfg, &project, &topic).await?
        }
        Commands::Quiz {
            project,
            topic,
            questions,
            difficulty,
        } => commands::run_quiz(&cfg, &project, &topic, questions, &difficulty).await?,
        Commands::Stats => stats::run_stats(&cfg).await?,
    }

    Ok(())
}
