// ABOUTME: AI extraction strategy backed by a remote Gemini model.
// ABOUTME: Truncates the page, sends one prompt with a deadline, and parses the JSON reply.

//! AI-based extraction.
//!
//! One outbound call per [`AiExtractor::extract`], never retried. Every
//! failure is an extraction failure the orchestrator can fall back from.

pub mod gemini;
pub mod prompt;
pub mod response;

use crate::content::ExtractedContent;
use crate::error::ExtractError;
use crate::options::AiOptions;

use self::gemini::GeminiClient;

/// Extracts an article by asking a generative model.
#[derive(Debug, Clone)]
pub struct AiExtractor {
    client: GeminiClient,
    options: AiOptions,
}

impl AiExtractor {
    /// Create an extractor for `credential`.
    ///
    /// Fails with a Configuration error when the credential is blank. No
    /// network call is made here.
    pub fn new(
        credential: &str,
        options: &AiOptions,
        http: reqwest::Client,
    ) -> Result<Self, ExtractError> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(ExtractError::configuration(
                "NewAiExtractor",
                Some(anyhow::anyhow!("API Key is required")),
            ));
        }

        Ok(Self {
            client: GeminiClient::new(http, options.endpoint.clone(), credential)
                .with_timeout(options.timeout),
            options: options.clone(),
        })
    }

    /// Extract the article from `html`, fetched from `url`.
    pub async fn extract(&self, html: &str, url: &str) -> Result<ExtractedContent, ExtractError> {
        let prompt = prompt::build_prompt(url, html, self.options.max_html_chars);
        let call = self.client.generate(&self.options.model, &prompt, url);

        let text = match tokio::time::timeout(self.options.timeout, call).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ExtractError::timeout(
                    url,
                    "GenerateContent",
                    Some(anyhow::anyhow!(
                        "no reply within {}ms",
                        self.options.timeout.as_millis()
                    )),
                ))
            }
        };

        response::parse_article(&text)
            .map_err(|e| ExtractError::response(url, "ParseResponse", Some(e)))
    }
}
