//! OpenAI-compatible chat completions client returning JSON-object completions.

use super::{context, vocabularies_from, GenerationError, PromptKind, TextGenerator};
use crate::config::GenerationSettings;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    response_format: ResponseFormat,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct OpenAiGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    prompts_dir: PathBuf,
}

impl OpenAiGenerator {
    pub fn new(settings: &GenerationSettings) -> Result<Self, GenerationError> {
        let api_key = settings.api_key.clone().ok_or(GenerationError::NotConfigured)?;
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(OpenAiGenerator {
            client,
            base_url: settings.base_url.clone(),
            api_key,
            model: settings.model.clone(),
            prompts_dir: settings.prompts_dir.clone(),
        })
    }

    async fn complete_json(&self, prompt: PromptKind, user: &str) -> Result<Value, GenerationError> {
        let system = prompt.load(&self.prompts_dir).await?;
        let request = ChatRequest {
            model: &self.model,
            response_format: ResponseFormat { kind: "json_object" },
            messages: [
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };
        let started = std::time::Instant::now();
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                body,
            });
        }
        let chat: ChatResponse = response.json().await?;
        tracing::info!(
            prompt = prompt.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "completion received"
        );
        completion_json(chat)
    }
}

fn definition_message(word: &str, topic: Option<&str>) -> String {
    match context(topic) {
        Some(topic) => format!("Word: {}, Context: {}", word, topic),
        None => format!("Word: {}", word),
    }
}

fn completion_json(chat: ChatResponse) -> Result<Value, GenerationError> {
    let content = chat
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| GenerationError::Malformed("completion has no content".into()))?;
    serde_json::from_str(&content).map_err(|e| GenerationError::Malformed(e.to_string()))
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn define_word(&self, word: &str, topic: Option<&str>) -> Result<Value, GenerationError> {
        self.complete_json(PromptKind::for_definition(topic), &definition_message(word, topic))
            .await
    }

    async fn list_vocabulary(&self, topic: &str) -> Result<Vec<String>, GenerationError> {
        let value = self
            .complete_json(PromptKind::VocabularyList, &format!("Theme: {}", topic))
            .await?;
        vocabularies_from(&value)
    }
}
