use std::fmt;
use std::time::Duration;

use serde_json::Value;
use tokio::runtime::Handle;
use tracing::debug;

use super::{ChatCompletionRequest, CommentaryConfig, CommentaryError, CommentaryProvider};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Chat-completion transport that authenticates with an `api-key` header.
///
/// `complete` blocks on the runtime handle it was built with, so callers must run it from a
/// blocking task rather than an async worker.
pub struct HttpCommentary {
    client: reqwest::Client,
    runtime: Handle,
    endpoint: String,
    api_key: String,
}

impl HttpCommentary {
    pub fn from_config(
        config: &CommentaryConfig,
        runtime: Handle,
    ) -> Result<Self, CommentaryError> {
        let (Some(endpoint), Some(api_key)) = (config.endpoint.clone(), config.api_key.clone())
        else {
            return Err(CommentaryError::NotConfigured);
        };

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(map_error)?;

        Ok(Self {
            client,
            runtime,
            endpoint,
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, request: &ChatCompletionRequest) -> Result<String, CommentaryError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(map_error)?
            .error_for_status()
            .map_err(map_error)?;

        let body: Value = response.json().await.map_err(map_error)?;
        extract_content(&body)
    }
}

impl CommentaryProvider for HttpCommentary {
    fn complete(&self, request: &ChatCompletionRequest) -> Result<String, CommentaryError> {
        debug!(
            messages = request.messages.len(),
            max_tokens = request.max_tokens,
            "posting commentary request"
        );
        self.runtime.block_on(self.post(request))
    }
}

impl fmt::Debug for HttpCommentary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpCommentary")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

/// Reads `choices[0].message.content`; a missing or blank answer is an empty response.
fn extract_content(body: &Value) -> Result<String, CommentaryError> {
    let content = body
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();

    if content.is_empty() {
        Err(CommentaryError::EmptyResponse)
    } else {
        Ok(content.to_string())
    }
}

fn map_error(error: reqwest::Error) -> CommentaryError {
    CommentaryError::Transport(error.to_string())
}
