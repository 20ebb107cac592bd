//! Study-task prompt framing and model-response parsing.
//!
//! Question answering, mind maps, and quizzes all start from a retrieved
//! context string. This module wraps that context with task instructions and
//! turns the model's free-form reply back into structured data. Replies that
//! cannot be parsed become [`RagError::ContentFormat`] carrying the raw text.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RagError, Result};

/// Reply the model is told to give when the context does not cover a question.
pub const NO_INFORMATION: &str = "There is no information about this topic in the documents";

/// Frame a question against retrieved context.
pub fn question_prompt(context: &str, question: &str) -> String {
    format!(
        "Based on this context: {context}\n\
         Answer the question: {question}\n\
         If the answer is not in the context, say \"{NO_INFORMATION}\"."
    )
}

/// Frame a mind-map request for `topic` against retrieved context.
pub fn mind_map_prompt(context: &str, topic: &str) -> String {
    format!(
        r##"Based on this context: {context}
Create a mind map based on the topic of {topic}.

Return the structure as JSON with:
{{
    "nodes": [
        {{
            "id": "unique_id_1",
            "label": "Main Concept 1",
            "size": 2,
            "color": "#6a9df6",
            "description": "Detailed explanation..."
        }}
    ],
    "edges": [
        {{
            "source": "source_node_id",
            "target": "target_node_id",
            "relation": "relationship_type"
        }}
    ]
}}
Include 5-7 main nodes and 2-3 subnodes for each.
Make the structure hierarchical and meaningful.
Ensure all node labels are unique and don't contain special characters."##
    )
}

/// Frame a multiple-choice quiz request against retrieved context.
pub fn quiz_prompt(context: &str, num_questions: usize, difficulty: &str) -> String {
    format!(
        "Generate exactly {num_questions} multiple-choice questions about this text.\n\
         Difficulty: {difficulty}\n\
         Format each question exactly like this:\n\
         \n\
         Question 1: [question text]\n\
         A) [option 1]\n\
         B) [option 2]\n\
         C) [option 3]\n\
         D) [option 4]\n\
         Correct Answer: [letter]\n\
         \n\
         Text:\n\
         {context}"
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindMapNode {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindMapEdge {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
}

/// Node/edge graph returned by the model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MindMap {
    pub nodes: Vec<MindMapNode>,
    pub edges: Vec<MindMapEdge>,
}

impl MindMap {
    /// The first node, used as the initial focus when rendering.
    pub fn root(&self) -> Option<&MindMapNode> {
        self.nodes.first()
    }
}

fn content_error(reason: impl Into<String>, raw: &str) -> RagError {
    RagError::ContentFormat {
        reason: reason.into(),
        raw: raw.to_string(),
    }
}

fn scalar_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a mind map from a model reply.
///
/// Markdown fences and surrounding prose are tolerated: the span from the
/// first `{` to the last `}` is parsed as JSON. Nodes without an id or label
/// and duplicate ids are dropped; edges whose endpoints are not known node
/// ids are dropped. A map with no usable nodes is an error.
pub fn parse_mind_map(raw: &str) -> Result<MindMap> {
    let (start, end) = match (raw.find('{'), raw.rfind('}')) {
        (Some(s), Some(e)) if s < e => (s, e),
        _ => return Err(content_error("no JSON object in response", raw)),
    };

    let json: Value = serde_json::from_str(&raw[start..=end])
        .map_err(|e| content_error(format!("invalid JSON: {}", e), raw))?;

    let nodes_json = json
        .get("nodes")
        .and_then(Value::as_array)
        .ok_or_else(|| content_error("'nodes' missing or not a list", raw))?;

    let mut map = MindMap::default();
    for node in nodes_json {
        let (Some(id), Some(label)) = (scalar_string(node.get("id")), scalar_string(node.get("label")))
        else {
            tracing::warn!(%node, "skipping mind map node without id/label");
            continue;
        };
        if map.nodes.iter().any(|n| n.id == id) {
            tracing::warn!(%id, "skipping duplicate mind map node");
            continue;
        }
        map.nodes.push(MindMapNode {
            id,
            label,
            size: node.get("size").and_then(Value::as_f64),
            color: scalar_string(node.get("color")),
            description: scalar_string(node.get("description")),
        });
    }

    if map.nodes.is_empty() {
        return Err(content_error("mind map has no valid nodes", raw));
    }

    let edges_json = json
        .get("edges")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for edge in edges_json {
        let (Some(source), Some(target)) =
            (scalar_string(edge.get("source")), scalar_string(edge.get("target")))
        else {
            tracing::warn!(%edge, "skipping mind map edge without source/target");
            continue;
        };
        let known = |id: &str| map.nodes.iter().any(|n| n.id == id);
        if !known(&source) || !known(&target) {
            tracing::warn!(%source, %target, "skipping mind map edge to unknown node");
            continue;
        }
        let relation = scalar_string(edge.get("relation")).or_else(|| scalar_string(edge.get("label")));
        map.edges.push(MindMapEdge {
            source,
            target,
            relation,
        });
    }

    Ok(map)
}

/// One multiple-choice question. `answer` is the text of the correct option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub topic: String,
    pub difficulty: String,
    pub questions: Vec<QuizQuestion>,
}

struct PendingQuestion {
    question: String,
    options: Vec<String>,
    answer: Option<usize>,
}

impl PendingQuestion {
    fn finish(self) -> Option<QuizQuestion> {
        let answer = self.options.get(self.answer?)?.clone();
        if self.question.is_empty() {
            return None;
        }
        Some(QuizQuestion {
            question: self.question,
            options: self.options,
            answer,
        })
    }
}

const OPTION_LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

/// Parse quiz questions in the `Question N:` / `A)`–`D)` / `Correct Answer:` format.
///
/// Markdown emphasis around line prefixes is ignored. Questions without
/// options or without a resolvable answer letter are dropped. A reply with
/// no complete question is an error.
pub fn parse_quiz(raw: &str) -> Result<Vec<QuizQuestion>> {
    let mut questions = Vec::new();
    let mut current: Option<PendingQuestion> = None;

    for line in raw.lines() {
        let line = line.trim().trim_start_matches(['*', '#']).trim();
        let line = line.replace("**", "");
        let line = line.trim();

        if let Some(rest) = line.strip_prefix("Question") {
            if let Some(done) = current.take().and_then(PendingQuestion::finish) {
                questions.push(done);
            }
            let text = rest.split_once(':').map(|(_, q)| q.trim()).unwrap_or("");
            current = Some(PendingQuestion {
                question: text.to_string(),
                options: Vec::new(),
                answer: None,
            });
        } else if let Some(rest) = line.strip_prefix("Correct Answer:") {
            let letter = rest.trim().chars().next().map(|c| c.to_ascii_uppercase());
            if let (Some(q), Some(letter)) = (current.as_mut(), letter) {
                q.answer = OPTION_LETTERS.iter().position(|&l| l == letter);
            }
        } else if let Some(option) = parse_option(line) {
            if let Some(q) = current.as_mut() {
                q.options.push(option.to_string());
            }
        }
    }

    if let Some(done) = current.and_then(PendingQuestion::finish) {
        questions.push(done);
    }

    if questions.is_empty() {
        return Err(content_error("no complete quiz questions in response", raw));
    }
    Ok(questions)
}

fn parse_option(line: &str) -> Option<&str> {
    let mut chars = line.chars();
    let letter = chars.next()?;
    if !OPTION_LETTERS.contains(&letter) || chars.next()? != ')' {
        return None;
    }
    Some(line[2..].trim())
}

/// File name for a generated artifact: `<topic>.json` with path separators
/// and control characters replaced by `_`.
pub fn artifact_file_name(topic: &str) -> String {
    let cleaned: String = topic
        .trim()
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
            {
                '_'
            } else {
                c
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        "untitled.json".to_string()
    } else {
        format!("{}.json", cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_prompt_contains_context_and_fallback() {
        let p = question_prompt("Cells divide by mitosis.", "How do cells divide?");
        assert!(p.starts_with("Based on this context: Cells divide by mitosis."));
        assert!(p.contains("Answer the question: How do cells divide?"));
        assert!(p.contains(NO_INFORMATION));
    }

    #[test]
    fn test_mind_map_prompt_shape() {
        let p = mind_map_prompt("ctx", "Photosynthesis");
        assert!(p.contains("topic of Photosynthesis"));
        assert!(p.contains("\"nodes\": ["));
        assert!(p.contains("\"color\": \"#6a9df6\""));
    }

    #[test]
    fn test_quiz_prompt_shape() {
        let p = quiz_prompt("Some text", 4, "Hard");
        assert!(p.contains("Generate exactly 4 multiple-choice questions"));
        assert!(p.contains("Difficulty: Hard"));
        assert!(p.ends_with("Text:\nSome text"));
    }

    #[test]
    fn test_parse_mind_map_with_fences() {
        let raw = r#"```json
{
  "nodes": [
    {"id": "1", "label": "Cell", "size": 2, "description": "Basic unit"},
    {"id": "2", "label": "Nucleus"},
    {"id": 3, "label": "Membrane"},
    {"label": "No id"}
  ],
  "edges": [
    {"source": "1", "target": "2", "relation": "contains"},
    {"source": "1", "target": "3", "label": "wrapped by"},
    {"source": "1", "target": "404"}
  ]
}
```"#;
        let map = parse_mind_map(raw).unwrap();
        assert_eq!(map.nodes.len(), 3);
        assert_eq!(map.root().unwrap().label, "Cell");
        assert_eq!(map.nodes[0].size, Some(2.0));
        assert_eq!(map.nodes[2].id, "3");
        assert_eq!(map.edges.len(), 2);
        assert_eq!(map.edges[0].relation.as_deref(), Some("contains"));
        assert_eq!(map.edges[1].relation.as_deref(), Some("wrapped by"));
    }

    #[test]
    fn test_parse_mind_map_missing_edges_is_ok() {
        let map = parse_mind_map(r#"{"nodes": [{"id": "a", "label": "A"}]}"#).unwrap();
        assert_eq!(map.nodes.len(), 1);
        assert!(map.edges.is_empty());
    }

    #[test]
    fn test_parse_mind_map_errors_keep_raw() {
        let raw = "Sorry, I cannot draw that.";
        let err = parse_mind_map(raw).unwrap_err();
        assert_eq!(err.raw_response(), Some(raw));

        let err = parse_mind_map(r#"{"nodes": "nope"}"#).unwrap_err();
        assert!(matches!(err, RagError::ContentFormat { .. }));

        let err = parse_mind_map(r#"{"nodes": [{"id": "x"}]}"#).unwrap_err();
        assert!(matches!(err, RagError::ContentFormat { .. }));

        let err = parse_mind_map("{ not json }").unwrap_err();
        assert!(matches!(err, RagError::ContentFormat { .. }));
    }

    #[test]
    fn test_parse_quiz() {
        let raw = "\
Question 1: What powers the cell?
A) Mitochondria
B) Ribosome
C) Golgi
D) Lysosome
Correct Answer: A

**Question 2:** Which process makes glucose?
A) Respiration
B) Photosynthesis
C) Fermentation
D) Osmosis
**Correct Answer:** b
";
        let questions = parse_quiz(raw).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].question, "What powers the cell?");
        assert_eq!(questions[0].options.len(), 4);
        assert_eq!(questions[0].answer, "Mitochondria");
        assert_eq!(questions[1].question, "Which process makes glucose?");
        assert_eq!(questions[1].answer, "Photosynthesis");
    }

    #[test]
    fn test_parse_quiz_drops_incomplete_questions() {
        let raw = "\
Question 1: No answer given
A) yes
B) no
Question 2: Answer out of range
A) only
Correct Answer: D
Question 3: Fine
A) x
B) y
Correct Answer: B";
        let questions = parse_quiz(raw).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question, "Fine");
        assert_eq!(questions[0].answer, "y");
    }

    #[test]
    fn test_parse_quiz_nothing_usable() {
        let err = parse_quiz("I'd rather not.").unwrap_err();
        assert_eq!(err.raw_response(), Some("I'd rather not."));
        assert!(parse_quiz("").is_err());
    }

    #[test]
    fn test_artifact_file_name() {
        assert_eq!(artifact_file_name("Cell Biology"), "Cell Biology.json");
        assert_eq!(artifact_file_name("../etc/passwd"), "_etc_passwd.json");
        assert_eq!(artifact_file_name("a/b\\c"), "a_b_c.json");
        assert_eq!(artifact_file_name("  "), "untitled.json");
    }
}
