// =============================================================================
// GEMINI CLIENT - Google AI Studio API Integration
// =============================================================================
//
// `AiProvider` backed by Google's Gemini API
// (https://ai.google.dev/gemini-api/docs).
//
// **API shape notes:**
// - Authentication: API key is passed as a query parameter (`?key=API_KEY`)
//   rather than a Bearer token in the Authorization header.
// - Request format: `contents[]` with nested `parts`.
// - Response format: Content is at `candidates[*].content.parts[*].text`.
//
// **Environment Variables:**
// - `GEMINI_API_KEY` - Your API key from https://aistudio.google.com/apikey
// - `GEMINI_MODEL` - Model name, e.g. `gemini-2.5-flash`

use crate::core::ai::{AiConfig, AiError, AiProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// =============================================================================
// GEMINI API DATA STRUCTURES
// =============================================================================
//
// These structs model the Gemini API request/response format.
// See: https://ai.google.dev/api/generate-content

/// A single part of content. Gemini uses a "parts" array even for plain text.
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

/// A message in the conversation; the diary only ever sends one user turn.
#[derive(Debug, Serialize, Deserialize)]
struct Content {
    /// Role: "user" or "model".
    role: String,
    parts: Vec<Part>,
}

/// Generation parameters that control the model's output.
#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// The request body sent to the generateContent endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Content,

    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

/// Error body returned by the Gemini API.
#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
    #[allow(dead_code)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorDetail,
}

// =============================================================================
// GEMINI CLIENT IMPLEMENTATION
// =============================================================================

/// Client for the Gemini generateContent endpoint.
pub struct GeminiClient {
    client: Client,
    api_key: String,
}

impl GeminiClient {
    /// Creates a new Gemini client with the given API key.
    ///
    /// The diary never streams, so a bounded overall request timeout keeps a
    /// hung call from pinning a submission forever.
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, api_key }
    }

    fn request_body(prompt: &str, config: &AiConfig) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: Some(GenerationConfig {
                temperature: Some(config.temperature),
                max_output_tokens: config.max_output_tokens,
            }),
        }
    }

    /// Joins the text parts of the first candidate into one string.
    fn extract_text(response: &GenerateContentResponse) -> Option<String> {
        let candidate = response.candidates.as_ref()?.first()?;

        let text: Vec<&str> = candidate
            .content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();

        if text.is_empty() {
            None
        } else {
            Some(text.join("\n"))
        }
    }
}

#[async_trait]
impl AiProvider for GeminiClient {
    async fn generate(&self, prompt: &str, config: &AiConfig) -> Result<String, AiError> {
        // API key goes in the query string, per the Gemini docs.
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            config.model, self.api_key
        );

        let request = Self::request_body(prompt, config);

        tracing::debug!(
            model = %config.model,
            prompt_chars = prompt.len(),
            "Gemini request"
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AiError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response
                .text()
                .await
                .map_err(|e| AiError::Request(e.to_string()))?;

            // Prefer the structured error message when the body parses.
            let message = serde_json::from_str::<GeminiErrorResponse>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);

            return Err(AiError::Api { status, message });
        }

        let response_json: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AiError::Request(e.to_string()))?;

        let content = Self::extract_text(&response_json).ok_or(AiError::EmptyResponse)?;

        tracing::debug!(content_chars = content.len(), "Gemini response received");
        Ok(content)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_camel_case() {
        let config = AiConfig {
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.7,
            max_output_tokens: Some(512),
        };
        let request = GeminiClient::request_body("hello", &config);

        let json = serde_json::to_string(&request).unwrap();

        assert!(json.contains("\"contents\""));
        assert!(json.contains("\"generationConfig\""));
        assert!(json.contains("\"maxOutputTokens\":512"));
        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("\"text\":\"hello\""));
    }

    #[test]
    fn unset_token_limit_is_omitted() {
        let config = AiConfig {
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.7,
            max_output_tokens: None,
        };
        let request = GeminiClient::request_body("hello", &config);

        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("maxOutputTokens"));
    }

    #[test]
    fn response_text_parts_are_joined() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "first"}, {"text": "second"}]
                },
                "finishReason": "STOP"
            }]
        }"#;

        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            GeminiClient::extract_text(&response),
            Some("first\nsecond".to_string())
        );
    }

    #[test]
    fn missing_candidates_yield_no_text() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(GeminiClient::extract_text(&response), None);
    }

    #[test]
    fn error_body_parses_for_diagnostics() {
        let json = r#"{"error": {"message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        let parsed: GeminiErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.error.message, "API key not valid");
    }
}
