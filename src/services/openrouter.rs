use std::time::Duration;

use base64::{engine::general_purpose, Engine};
use serde::{Deserialize, Serialize};

use super::ai_service::{GenerativeModel, UpstreamError};

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageData },
}

#[derive(Debug, Serialize)]
struct ImageData {
    url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    content: Option<String>,
}

/// OpenAI-compatible chat completions through OpenRouter.
pub struct OpenRouterService {
    api_key: String,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenRouterService {
    pub fn new(api_key: String, model: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_key,
            model,
            timeout,
            client,
        })
    }

    async fn chat(&self, content: Vec<ContentPart>, max_tokens: u32) -> Result<String, UpstreamError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content,
            }],
            max_tokens,
        };

        log::info!("🤖 Sending request to OpenRouter with model: {}", self.model);

        let response = self
            .client
            .post(OPENROUTER_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", "https://github.com/protein-tracker")
            .header("X-Title", "Protein Tracker")
            .json(&request)
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        log::debug!("📥 OpenRouter response status: {}", status);

        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.timeout))?;

        if !status.is_success() {
            log::error!("❌ OpenRouter API error ({}): {}", status, body);
            return Err(UpstreamError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        log::debug!("📄 Raw OpenRouter response size: {} bytes", body.len());

        let chat_response: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))?;

        first_message(chat_response)
    }
}

fn first_message(response: ChatResponse) -> Result<String, UpstreamError> {
    response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content.unwrap_or_default())
        .ok_or_else(|| UpstreamError::InvalidResponse("no choices in response".to_string()))
}

#[async_trait::async_trait]
impl GenerativeModel for OpenRouterService {
    async fn describe_image(
        &self,
        prompt: &str,
        image: &[u8],
        media_type: &str,
    ) -> Result<String, UpstreamError> {
        let base64_image = general_purpose::STANDARD.encode(image);
        log::debug!("📊 Image size: {} bytes", image.len());
        log::debug!("🔄 Base64 encoded size: {} bytes", base64_image.len());

        let content = vec![
            ContentPart::Text {
                text: prompt.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageData {
                    url: format!("data:{};base64,{}", media_type, base64_image),
                },
            },
        ];

        self.chat(content, 500).await
    }

    async fn complete(&self, prompt: &str) -> Result<String, UpstreamError> {
        self.chat(
            vec![ContentPart::Text {
                text: prompt.to_string(),
            }],
            200,
        )
        .await
    }

    fn provider_name(&self) -> &'static str {
        "openrouter"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_parts_are_tagged_by_type() {
        let parts = vec![
            ContentPart::Text {
                text: "hi".to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageData {
                    url: "data:image/jpeg;base64,AAAA".to_string(),
                },
            },
        ];

        let json = serde_json::to_value(&parts).unwrap();
        assert_eq!(json[0], serde_json::json!({"type": "text", "text": "hi"}));
        assert_eq!(json[1]["type"], "image_url");
        assert_eq!(json[1]["image_url"]["url"], "data:image/jpeg;base64,AAAA");
    }

    #[test]
    fn test_first_message() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Food: rice"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_message(response).unwrap(), "Food: rice");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(first_message(empty).is_err());

        let null_content: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert_eq!(first_message(null_content).unwrap(), "");

        let blank: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"  "}}]}"#).unwrap();
        assert_eq!(first_message(blank).unwrap(), "  ");
    }
}
