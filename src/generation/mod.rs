//! Text generation collaborator: word definitions and topic vocabulary lists from a language model.

mod openai;

pub use openai::OpenAiGenerator;

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("generation service not configured (set OPENAI_API_KEY)")]
    NotConfigured,
    #[error("prompt '{name}' unavailable at {path}: {source}")]
    Prompt {
        name: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("malformed completion: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Definitions of `word`, optionally within a topic. Shape: `{"definitions": [...]}`.
    async fn define_word(&self, word: &str, topic: Option<&str>) -> Result<Value, GenerationError>;

    /// Vocabulary words for a topic.
    async fn list_vocabulary(&self, topic: &str) -> Result<Vec<String>, GenerationError>;
}

/// Used when no API key is configured; every call fails.
pub struct UnconfiguredGenerator;

#[async_trait]
impl TextGenerator for UnconfiguredGenerator {
    async fn define_word(&self, _word: &str, _topic: Option<&str>) -> Result<Value, GenerationError> {
        Err(GenerationError::NotConfigured)
    }

    async fn list_vocabulary(&self, _topic: &str) -> Result<Vec<String>, GenerationError> {
        Err(GenerationError::NotConfigured)
    }
}

/// System prompt templates, one text file per name under the prompts directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptKind {
    WordDefinition,
    WordDefinitionInContext,
    VocabularyList,
}

impl PromptKind {
    pub fn name(self) -> &'static str {
        match self {
            PromptKind::WordDefinition => "get_word_definition",
            PromptKind::WordDefinitionInContext => "get_word_definition_in_context",
            PromptKind::VocabularyList => "get_vocabulary_list",
        }
    }

    /// A blank topic is no context.
    pub fn for_definition(topic: Option<&str>) -> Self {
        match context(topic) {
            Some(_) => PromptKind::WordDefinitionInContext,
            None => PromptKind::WordDefinition,
        }
    }

    pub async fn load(self, dir: &Path) -> Result<String, GenerationError> {
        let path = dir.join(format!("{}.txt", self.name()));
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| GenerationError::Prompt {
                name: self.name(),
                path,
                source,
            })
    }
}

pub(crate) fn context(topic: Option<&str>) -> Option<&str> {
    topic.filter(|t| !t.trim().is_empty())
}

/// Pull the `vocabularies` string array out of a completion object.
pub fn vocabularies_from(value: &Value) -> Result<Vec<String>, GenerationError> {
    let items = value
        .get("vocabularies")
        .and_then(Value::as_array)
        .ok_or_else(|| GenerationError::Malformed("missing 'vocabularies' array".into()))?;
    items
        .iter()
        .map(|v| {
            v.as_str()
                .map(String::from)
                .ok_or_else(|| GenerationError::Malformed(format!("vocabulary entry is not a string: {}", v)))
        })
        .collect()
}
