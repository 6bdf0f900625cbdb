use crate::config::GeminiConfig;
use crate::llm::{Gateway, GenerationError};

pub fn generate_endpoint(base_url: &str, model: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    format!("{base_url}/models/{model}:generateContent")
}

/// Blocking client for the Gemini `generateContent` API.
pub struct GeminiGateway {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiGateway {
    pub fn new(config: GeminiConfig) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| anyhow::anyhow!("build http client: {err}"))?;
        Ok(Self {
            client,
            endpoint: generate_endpoint(&config.base_url, &config.model),
            api_key: config.api_key,
        })
    }
}

impl Gateway for GeminiGateway {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = serde_json::json!({
            "contents": [
                { "role": "user", "parts": [ { "text": prompt } ] }
            ],
        });

        tracing::debug!(endpoint = %self.endpoint, prompt_chars = prompt.chars().count(), "gemini request");

        let transport = |source: reqwest::Error| GenerationError::Transport {
            endpoint: self.endpoint.clone(),
            source,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(transport)?;

        let status = response.status();
        let raw = response.text().map_err(transport)?;
        if !status.is_success() {
            let message = parse_error_message(&raw).unwrap_or(raw);
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let value: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|err| GenerationError::Malformed(format!("parse response json: {err}")))?;
        extract_output_text(&value)
    }
}

fn parse_error_message(raw_json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw_json).ok()?;
    let message = value.get("error")?.get("message")?.as_str()?.to_owned();
    Some(message)
}

fn extract_output_text(value: &serde_json::Value) -> Result<String, GenerationError> {
    let candidates = value
        .get("candidates")
        .and_then(|v| v.as_array())
        .ok_or_else(|| GenerationError::Malformed("missing `candidates` array".to_owned()))?;

    // Only the first candidate is used; the request never asks for more.
    let mut text = String::new();
    if let Some(parts) = candidates
        .first()
        .and_then(|c| c.pointer("/content/parts"))
        .and_then(|v| v.as_array())
    {
        for part in parts {
            if part.get("thought").and_then(|v| v.as_bool()) == Some(true) {
                continue;
            }
            let Some(part_text) = part.get("text").and_then(|v| v.as_str()) else {
                continue;
            };
            text.push_str(part_text);
        }
    }

    if text.trim().is_empty() {
        return Err(GenerationError::EmptyOutput);
    }
    Ok(text)
}
