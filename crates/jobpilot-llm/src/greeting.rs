//! Personalized greeting generation against an OpenAI-compatible API.
//!
//! The model is asked to either write a short greeting for one listing or
//! answer `false` when the listing clearly does not match the candidate's
//! introduction. Callers treat an empty or `false` answer as "use the
//! configured template instead"; generation failure never fails a delivery.

use crate::error::{LlmError, Result};
use async_trait::async_trait;
use jobpilot_core::{JobRecord, LlmConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fallback self-introduction when the config leaves it empty.
const DEFAULT_INTRODUCTION: &str = "具备相关技能和经验";

/// Generates a greeting for one job listing.
#[async_trait]
pub trait GreetingGenerator: Send + Sync {
    /// Produce a greeting, or the rejection sentinel `false` when the model
    /// judges the listing a clear mismatch. `keyword` is the search term
    /// that surfaced the listing.
    async fn generate(&self, job: &JobRecord, keyword: &str) -> Result<String>;
}

/// Whether a model answer means "do not use this, fall back to the template".
#[must_use]
pub fn is_rejection(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed.to_lowercase().contains("false")
}

/// Greeter backed by an OpenAI-compatible HTTP API.
pub struct OpenAiGreeter {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    introduction: String,
}

impl OpenAiGreeter {
    /// Build a greeter from the LLM section of the app config.
    ///
    /// # Errors
    /// Returns `LlmError::Http` if the HTTP client cannot be created.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            introduction: config.introduction.clone(),
        })
    }

    fn build_prompt(&self, job: &JobRecord, keyword: &str) -> String {
        let introduction = if self.introduction.trim().is_empty() {
            DEFAULT_INTRODUCTION
        } else {
            self.introduction.trim()
        };

        format!(
            "你是一位正在求职的候选人。请根据下面的职位信息和个人介绍，\
             写一段向招聘者打招呼的话，表达求职意向。\n\n\
             搜索关键词：{keyword}\n\
             职位名称：{title}\n\
             公司名称：{company}\n\
             经验要求：{experience}\n\
             学历要求：{degree}\n\
             职位描述：{description}\n\n\
             个人介绍：{introduction}\n\n\
             要求：\n\
             1. 如果职位与个人介绍明显不匹配，只回复 false，不要输出其他内容。\n\
             2. 语气礼貌自然，不超过60字。\n\
             3. 直接输出打招呼内容，不要任何解释或前缀。",
            title = job.title,
            company = job.company,
            experience = job.experience,
            degree = job.degree,
            description = job.description,
        )
    }

    /// Reasoning-style models only answer on the responses endpoint; the
    /// rest use chat completions.
    fn uses_responses_api(model: &str) -> bool {
        let model = model.to_lowercase();
        if model.contains("4o") {
            return false;
        }
        model.starts_with("o1")
            || model.starts_with("o3")
            || model.starts_with("o4")
            || model.contains("4.1")
            || model.contains("reasoner")
    }

    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<serde_json::Value> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::Parse(format!("invalid JSON response: {e}")))
    }

    async fn complete_chat(&self, prompt: String) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            temperature: 0.5,
        };

        let value = self.post_json("/chat/completions", &request).await?;
        let response: ChatResponse = serde_json::from_value(value)
            .map_err(|e| LlmError::Parse(format!("unexpected chat response shape: {e}")))?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|s| !s.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }

    async fn complete_responses(&self, prompt: String) -> Result<String> {
        let request = ResponsesRequest {
            model: self.model.clone(),
            input: prompt,
            temperature: 0.5,
        };

        let value = self.post_json("/responses", &request).await?;

        // Prefer the flattened field; fall back to walking the output list.
        if let Some(text) = value.get("output_text").and_then(|v| v.as_str()) {
            if !text.trim().is_empty() {
                return Ok(text.to_string());
            }
        }

        let text = value
            .get("output")
            .and_then(|v| v.as_array())
            .into_iter()
            .flatten()
            .filter_map(|item| item.get("content").and_then(|c| c.as_array()))
            .flatten()
            .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            Err(LlmError::EmptyResponse)
        } else {
            Ok(text)
        }
    }
}

#[async_trait]
impl GreetingGenerator for OpenAiGreeter {
    async fn generate(&self, job: &JobRecord, keyword: &str) -> Result<String> {
        let prompt = self.build_prompt(job, keyword);
        tracing::debug!("Generating greeting for {}", job.context());

        let text = if Self::uses_responses_api(&self.model) {
            self.complete_responses(prompt).await?
        } else {
            self.complete_chat(prompt).await?
        };

        Ok(text.trim().to_string())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Serialize)]
struct ResponsesRequest {
    model: String,
    input: String,
    temperature: f32,
}
