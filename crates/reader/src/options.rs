// ABOUTME: Configuration options for the reader pipeline including Options, AiOptions and OrchestratorBuilder.
// ABOUTME: OrchestratorBuilder provides a fluent API for constructing Orchestrator instances with custom settings.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::ExtractError;
use crate::orchestrator::Orchestrator;

/// Default generative model.
pub const DEFAULT_MODEL: &str = "gemini-pro";

/// Default Gemini REST endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Raw HTML sent to the model is cut to this many characters.
pub const DEFAULT_MAX_HTML_CHARS: usize = 30_000;

/// Settings for the AI extraction strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiOptions {
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
    pub max_html_chars: usize,
}

impl Default for AiOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
            max_html_chars: DEFAULT_MAX_HTML_CHARS,
        }
    }
}

/// Configuration options for the orchestrator.
#[derive(Debug, Clone)]
pub struct Options {
    pub timeout: Duration,
    pub user_agent: String,
    pub allow_private_networks: bool,
    pub http_client: Option<reqwest::Client>,
    pub headers: HashMap<String, String>,
    pub ai: AiOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: "ZenReader/0.1".to_string(),
            allow_private_networks: false,
            http_client: None,
            headers: HashMap::new(),
            ai: AiOptions::default(),
        }
    }
}

/// Builder for constructing Orchestrator instances with custom configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorBuilder {
    opts: Options,
}

impl OrchestratorBuilder {
    /// Create a new OrchestratorBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
        }
    }

    /// Set the page fetch timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Allow or disallow page fetches from private networks.
    pub fn allow_private_networks(mut self, allow: bool) -> Self {
        self.opts.allow_private_networks = allow;
        self
    }

    /// Use a custom HTTP client for both the page fetch and the model call.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Add a custom header to page fetches.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Set the generative model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.opts.ai.model = model.into();
        self
    }

    /// Set the Gemini endpoint base URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.opts.ai.endpoint = endpoint.into();
        self
    }

    /// Set the deadline for the model call.
    pub fn ai_timeout(mut self, timeout: Duration) -> Self {
        self.opts.ai.timeout = timeout;
        self
    }

    /// Set how many characters of raw HTML are sent to the model.
    pub fn max_html_chars(mut self, max: usize) -> Self {
        self.opts.ai.max_html_chars = max;
        self
    }

    /// Replace all AI settings at once.
    pub fn ai(mut self, ai: AiOptions) -> Self {
        self.opts.ai = ai;
        self
    }

    /// Build the Orchestrator with the configured options.
    pub fn build(self) -> Result<Orchestrator, ExtractError> {
        Orchestrator::new(self.opts)
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
