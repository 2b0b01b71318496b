//! Boundary to the external chat-completion service that writes narrative commentary.
//!
//! The crate builds requests, defines the provider contract, and ships an HTTP transport.
//! Endpoint and credentials are always injected through [`CommentaryConfig`].

mod http;
mod prompts;

pub use http::HttpCommentary;
pub use prompts::{
    anomaly_request, credit_trend_request, financial_advice_request, insight_request,
    portfolio_chat_request, profile_analysis_request, report_request, risk_explanation_request,
    ChatContext, ReportPromptData,
};

use serde::{Deserialize, Serialize};

/// Connection settings for the commentary service.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentaryConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CommentaryConfig {
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;
    pub const DEFAULT_MAX_TOKENS: u32 = 2000;

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some() && self.api_key.is_some()
    }
}

impl Default for CommentaryConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            temperature: Self::DEFAULT_TEMPERATURE,
            max_tokens: Self::DEFAULT_MAX_TOKENS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Wire shape of a chat-completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatCompletionRequest {
    pub fn new(config: &CommentaryConfig, system: &str, prompt: String) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(prompt)],
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    pub fn user_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|message| message.role == ChatRole::User)
            .map(|message| message.content.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommentaryError {
    #[error("commentary service is not configured")]
    NotConfigured,
    #[error("commentary transport failed: {0}")]
    Transport(String),
    #[error("commentary service returned an empty response")]
    EmptyResponse,
}

/// Contract for anything that can turn a chat request into narrative text.
pub trait CommentaryProvider: Send + Sync {
    fn complete(&self, request: &ChatCompletionRequest) -> Result<String, CommentaryError>;
}

/// Provider used when no service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCommentary;

impl CommentaryProvider for DisabledCommentary {
    fn complete(&self, _request: &ChatCompletionRequest) -> Result<String, CommentaryError> {
        Err(CommentaryError::NotConfigured)
    }
}
