use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::{GeminiService, OpenRouterService};
use crate::config::{AiProvider, Config};

/// Failure talking to the generative model. There is no response text to work with.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("malformed response: {0}")]
    InvalidResponse(String),
}

impl UpstreamError {
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout(timeout)
        } else {
            UpstreamError::RequestFailed(err.to_string())
        }
    }
}

/// A multimodal model that can answer a text prompt, optionally about an image.
#[async_trait::async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn describe_image(
        &self,
        prompt: &str,
        image: &[u8],
        media_type: &str,
    ) -> Result<String, UpstreamError>;

    async fn complete(&self, prompt: &str) -> Result<String, UpstreamError>;

    fn provider_name(&self) -> &'static str;

    fn model_name(&self) -> &str;
}

/// Build the provider selected by `AI_PROVIDER`.
pub fn create_provider(config: &Config) -> anyhow::Result<Arc<dyn GenerativeModel>> {
    let timeout = config.ai.timeout;
    let model: Arc<dyn GenerativeModel> = match config.ai.provider {
        AiProvider::Gemini => Arc::new(GeminiService::new(
            config.ai.api_key.clone(),
            config.ai.model.clone(),
            timeout,
        )?),
        AiProvider::OpenRouter => Arc::new(OpenRouterService::new(
            config.ai.api_key.clone(),
            config.ai.model.clone(),
            timeout,
        )?),
    };

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_error_messages() {
        let err = UpstreamError::ApiError {
            status: 429,
            message: "quota exceeded".to_string(),
        };
        assert_eq!(err.to_string(), "API error (429): quota exceeded");

        let err = UpstreamError::Timeout(Duration::from_secs(60));
        assert_eq!(err.to_string(), "timed out after 60s");
    }
}
