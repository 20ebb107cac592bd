//! Study tasks built on retrieval: question answering, mind maps, quizzes.
//!
//! Each task retrieves context for the project, refuses to call the model
//! when nothing was retrieved, frames the prompt, and parses the reply.
//! Mind maps and quizzes are also written to
//! `<project>/mindmaps/<topic>.json` and `<project>/quizzes/<topic>.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use studydesk_core::embedding::CompletionProvider;
use studydesk_core::models::{Project, ScoredChunk};
use studydesk_core::retrieval::{RetrievalEngine, RetrievedContext};
use studydesk_core::study::{
    artifact_file_name, mind_map_prompt, parse_mind_map, parse_quiz, question_prompt, quiz_prompt,
    MindMap, Quiz,
};
use studydesk_core::{RagError, Result};

use crate::repository::{MINDMAPS_DIR, QUIZZES_DIR};

/// Outcome of [`StudyService::answer_question`].
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// The model answered using the retrieved chunks.
    Answered {
        text: String,
        chunks: Vec<ScoredChunk>,
    },
    /// Nothing in the project was retrieved; the model was not called.
    NoInformation,
}

/// A generated artifact and where it was saved.
#[derive(Debug, Clone)]
pub struct Saved<T> {
    pub value: T,
    pub path: PathBuf,
    pub chunks: Vec<ScoredChunk>,
}

pub struct StudyService {
    engine: RetrievalEngine,
    completion: Arc<dyn CompletionProvider>,
    top_k: usize,
}

impl StudyService {
    pub fn new(engine: RetrievalEngine, completion: Arc<dyn CompletionProvider>, top_k: usize) -> Self {
        Self {
            engine,
            completion,
            top_k,
        }
    }

    async fn context_for(&self, project: &Project, query: &str) -> Result<RetrievedContext> {
        self.engine
            .retrieve_context(query, &project.id, self.top_k)
            .await
    }

    pub async fn answer_question(&self, project: &Project, question: &str) -> Result<Answer> {
        let retrieved = self.context_for(project, question).await?;
        if retrieved.is_empty() {
            tracing::info!(project = %project.name, "no context retrieved, not asking the model");
            return Ok(Answer::NoInformation);
        }

        let text = self
            .completion
            .complete(&question_prompt(&retrieved.context, question))
            .await?;
        Ok(Answer::Answered {
            text: text.trim().to_string(),
            chunks: retrieved.chunks,
        })
    }

    pub async fn build_mind_map(&self, project: &Project, topic: &str) -> Result<Saved<MindMap>> {
        let retrieved = self.require_context(project, topic).await?;
        let raw = self
            .completion
            .complete(&mind_map_prompt(&retrieved.context, topic))
            .await?;
        let map = parse_mind_map(&raw)?;

        let path = Path::new(&project.path)
            .join(MINDMAPS_DIR)
            .join(artifact_file_name(topic));
        write_json(&path, &map).await?;
        tracing::info!(project = %project.name, nodes = map.nodes.len(), edges = map.edges.len(), path = %path.display(), "saved mind map");

        Ok(Saved {
            value: map,
            path,
            chunks: retrieved.chunks,
        })
    }

    pub async fn generate_quiz(
        &self,
        project: &Project,
        topic: &str,
        num_questions: usize,
        difficulty: &str,
    ) -> Result<Saved<Quiz>> {
        if num_questions == 0 {
            return Err(RagError::InvalidInput(
                "a quiz needs at least one question".to_string(),
            ));
        }
        let retrieved = self.require_context(project, topic).await?;
        let raw = self
            .completion
            .complete(&quiz_prompt(&retrieved.context, num_questions, difficulty))
            .await?;

        let mut questions = parse_quiz(&raw)?;
        if questions.len() < num_questions {
            tracing::warn!(requested = num_questions, parsed = questions.len(), "model returned fewer questions than requested");
        }
        questions.truncate(num_questions);

        let quiz = Quiz {
            topic: topic.to_string(),
            difficulty: difficulty.to_string(),
            questions,
        };
        let path = Path::new(&project.path)
            .join(QUIZZES_DIR)
            .join(artifact_file_name(topic));
        write_json(&path, &quiz).await?;
        tracing::info!(project = %project.name, questions = quiz.questions.len(), path = %path.display(), "saved quiz");

        Ok(Saved {
            value: quiz,
            path,
            chunks: retrieved.chunks,
        })
    }

    async fn require_context(&self, project: &Project, topic: &str) -> Result<RetrievedContext> {
        let retrieved = self.context_for(project, topic).await?;
        if retrieved.is_empty() {
            return Err(RagError::NoContext {
                project_id: project.id.clone(),
                query: topic.to_string(),
            });
        }
        Ok(retrieved)
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)
        .map_err(|e| RagError::Storage(format!("failed to serialize artifact: {}", e)))?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, json).await?;
    Ok(())
}
