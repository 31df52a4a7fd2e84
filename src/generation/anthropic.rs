use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::GenerationSettings;

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    text: String,
}

pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: String,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Sends a single user message and returns the first text block of the reply.
    pub async fn complete(&self, prompt: &str, settings: &GenerationSettings) -> Result<String> {
        let request = AnthropicRequest {
            model: &settings.model,
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Anthropic API")?
            .error_for_status()
            .context("Anthropic API error")?;

        let api_response: AnthropicResponse = response
            .json()
            .await
            .context("Failed to parse Anthropic API response")?;

        first_text(api_response)
    }
}

fn first_text(response: AnthropicResponse) -> Result<String> {
    let content = response
        .content
        .into_iter()
        .next()
        .context("No content in Anthropic response")?;

    Ok(content.text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let settings = GenerationSettings::default();
        let request = AnthropicRequest {
            model: &settings.model,
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            messages: vec![Message {
                role: "user",
                content: "hola",
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], settings.model.as_str());
        assert_eq!(json["max_tokens"], 2000);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hola");
    }

    #[test]
    fn test_first_text() {
        let response: AnthropicResponse = serde_json::from_str(
            r#"{"id":"msg_1","content":[{"type":"text","text":"DIALOGUE 1:"},{"type":"text","text":"ignored"}]}"#,
        )
        .unwrap();
        assert_eq!(first_text(response).unwrap(), "DIALOGUE 1:");
    }

    #[test]
    fn test_first_text_empty_content() {
        let response: AnthropicResponse = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        let error = first_text(response).unwrap_err();
        assert!(error.to_string().contains("No content"));
    }
}
