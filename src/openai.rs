use crate::config::TranslatorConfig;
use crate::error::{ProviderError, TranslatorError};
use crate::models::{ModelData, TokenUsage};
use crate::provider::{Translation, TranslationProvider};
use crate::retry::{with_retry_if, RetryConfig};
use serde::{Deserialize, Serialize};

/// OpenAI Chat Completion request for one dictionary value
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

/// Build the system prompt for translating dictionary values
fn build_system_prompt(source_language: &str, target_language: &str) -> String {
    format!(
        "You are an application localization helper translating from {source} to {target}. \
         Do not write any comments, reply with the translated text only. \
         The translation should be correct and sound native for {target}. \
         Be careful with the syntax: keep placeholders, variables, markup and line breaks unchanged.",
        source = source_language,
        target = target_language
    )
}

/// Translation provider backed by the OpenAI chat completions API.
#[derive(Debug, Clone)]
pub struct OpenAiTranslator {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: &'static ModelData,
    source_language: String,
    retry: RetryConfig,
}

impl OpenAiTranslator {
    pub fn from_config(config: &TranslatorConfig, source_language: &str) -> Result<Self, TranslatorError> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_url: config.openai_api_url.clone(),
            api_key: config.gpt_token.clone(),
            model: config.model()?,
            source_language: source_language.to_string(),
            retry: RetryConfig::api_call(),
        })
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn build_request(&self, text: &str, target_language: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.name.to_string(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: build_system_prompt(&self.source_language, target_language),
                },
                Message {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            temperature: self.model.temperature,
            max_tokens: self.model.max_tokens,
            top_p: self.model.top_p,
            frequency_penalty: self.model.frequency_penalty,
            presence_penalty: self.model.presence_penalty,
        }
    }

    async fn send(&self, request: &ChatRequest) -> Result<Translation, ProviderError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let chat_response: ChatResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))?;

        let text = chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(ProviderError::EmptyResponse)?;

        let usage = chat_response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(Translation::new(text, usage))
    }
}

impl TranslationProvider for OpenAiTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<Translation, ProviderError> {
        let request = self.build_request(text, target_language);

        with_retry_if(
            &self.retry,
            &format!("Translation to {}", target_language),
            || self.send(&request),
            ProviderError::is_retryable,
        )
        .await
    }
}
