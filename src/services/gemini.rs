use std::time::Duration;

use base64::{engine::general_purpose, Engine};
use serde::{Deserialize, Serialize};

use super::ai_service::{GenerativeModel, UpstreamError};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiApiError,
}

#[derive(Debug, Deserialize)]
struct GeminiApiError {
    message: String,
}

/// Google Gemini `generateContent` client.
pub struct GeminiService {
    api_key: String,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl GeminiService {
    pub fn new(api_key: String, model: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_key,
            model,
            timeout,
            client,
        })
    }

    async fn generate(&self, parts: Vec<Part>, max_tokens: u32) -> Result<String, UpstreamError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: GenerationConfig {
                max_output_tokens: max_tokens,
            },
        };

        log::info!("🤖 Sending request to Gemini with model: {}", self.model);

        let response = self
            .client
            .post(format!("{}/{}:generateContent", GEMINI_API_BASE, self.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        log::debug!("📥 Gemini response status: {}", status);

        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.timeout))?;

        if !status.is_success() {
            let message = serde_json::from_str::<GeminiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            log::error!("❌ Gemini API error ({}): {}", status, message);
            return Err(UpstreamError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))?;

        extract_text(parsed)
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(response: GenerateContentResponse) -> Result<String, UpstreamError> {
    let content = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .ok_or_else(|| UpstreamError::InvalidResponse("no candidates in response".to_string()))?;

    Ok(content.parts.into_iter().filter_map(|p| p.text).collect())
}

#[async_trait::async_trait]
impl GenerativeModel for GeminiService {
    async fn describe_image(
        &self,
        prompt: &str,
        image: &[u8],
        media_type: &str,
    ) -> Result<String, UpstreamError> {
        log::debug!("📊 Image size: {} bytes ({})", image.len(), media_type);

        let parts = vec![
            Part::Text {
                text: prompt.to_string(),
            },
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: media_type.to_string(),
                    data: general_purpose::STANDARD.encode(image),
                },
            },
        ];

        self.generate(parts, 500).await
    }

    async fn complete(&self, prompt: &str) -> Result<String, UpstreamError> {
        self.generate(
            vec![Part::Text {
                text: prompt.to_string(),
            }],
            200,
        )
        .await
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part::Text {
                        text: "what is this?".to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/png".to_string(),
                            data: "aGk=".to_string(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: 500,
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "what is this?");
        assert_eq!(
            json["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            "image/png"
        );
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 500);
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"foodName\":"},{"text":"\"Poha\"}"}],"role":"model"}}]}"#,
        )
        .unwrap();

        assert_eq!(extract_text(response).unwrap(), "{\"foodName\":\"Poha\"}");
    }

    #[test]
    fn test_extract_text_allows_empty_parts() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":""}]}}]}"#).unwrap();
        assert_eq!(extract_text(response).unwrap(), "");

        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[]}}]}"#).unwrap();
        assert_eq!(extract_text(response).unwrap(), "");
    }

    #[test]
    fn test_extract_text_without_candidates_is_an_error() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();

        assert!(matches!(
            extract_text(response),
            Err(UpstreamError::InvalidResponse(_))
        ));
    }
}
