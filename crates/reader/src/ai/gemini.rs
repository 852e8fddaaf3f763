// ABOUTME: Minimal Gemini REST client for the generateContent call.
// ABOUTME: Classifies failures into transport, timeout and response errors without leaking raw error text.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

const OP: &str = "GenerateContent";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// Client for `POST {endpoint}/v1beta/models/{model}:generateContent`.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout: Option<Duration>,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout: None,
        }
    }

    /// Per-request deadline. Overrides any timeout set on the shared client.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn request_url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, model)
    }

    /// Send one prompt and return the text of the first candidate.
    ///
    /// `source_url` is only used to label errors.
    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        source_url: &str,
    ) -> Result<String, ExtractError> {
        let body = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [Part { text: prompt }],
            }],
        };

        tracing::debug!(model, prompt_chars = prompt.chars().count(), "calling model");
        let mut request = self
            .http
            .post(self.request_url(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let response = request
            .send()
            .await
            .map_err(|e| classify_send_error(source_url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::transport(
                source_url,
                OP,
                Some(anyhow::anyhow!("model API returned HTTP {}", status.as_u16())),
            ));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ExtractError::timeout(source_url, OP, Some(e.into()))
            } else {
                ExtractError::response(source_url, OP, Some(e.into()))
            }
        })?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ExtractError::response(
                source_url,
                OP,
                Some(anyhow::anyhow!("model reply has no candidate text")),
            ));
        }

        Ok(text)
    }
}

fn classify_send_error(source_url: &str, e: reqwest::Error) -> ExtractError {
    if e.is_timeout() {
        ExtractError::timeout(source_url, OP, Some(e.into()))
    } else {
        ExtractError::transport(source_url, OP, Some(e.into()))
    }
}
