// ABOUTME: Error types for the reader pipeline including the ErrorCode enum and ExtractError struct.
// ABOUTME: Provides categorized errors with convenience constructors, boolean helpers and user-facing messages.

use std::fmt;

/// Error codes representing the categories of pipeline failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Missing or unusable configuration, e.g. a blank credential.
    Configuration,
    /// No URL or no page content was handed to the pipeline.
    Input,
    /// The page itself could not be fetched.
    Fetch,
    /// The generative model could not be reached or answered with a non-2xx status.
    Transport,
    /// The generative model did not answer in time.
    Timeout,
    /// The generative model answered with something that is not an article object.
    Response,
    /// The heuristic extractor found no readable content region.
    NoContent,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::Configuration => "configuration error",
            ErrorCode::Input => "missing input",
            ErrorCode::Fetch => "fetch error",
            ErrorCode::Transport => "model request failed",
            ErrorCode::Timeout => "model request timed out",
            ErrorCode::Response => "malformed model response",
            ErrorCode::NoContent => "no readable content",
        };
        write!(f, "{}", s)
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// The main error type for extraction operations.
///
/// The `Display` output only names the operation, the URL and the category.
/// The underlying cause (transport errors, serde errors) stays in `source`
/// so it can be logged without being shown to an end user.
#[derive(Debug, thiserror::Error)]
pub struct ExtractError {
    pub code: ErrorCode,
    pub url: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.url.is_empty() {
            write!(f, "zen-reader: {}: {}", self.op, self.code)
        } else {
            write!(f, "zen-reader: {} {}: {}", self.op, self.url, self.code)
        }
    }
}

impl ExtractError {
    fn with_code(
        code: ErrorCode,
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code,
            url: url.into(),
            op: op.into(),
            source,
        }
    }

    /// Create a Configuration error.
    pub fn configuration(op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self::with_code(ErrorCode::Configuration, String::new(), op, source)
    }

    /// Create an Input error.
    pub fn input(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Input, url, op, source)
    }

    /// Create a Fetch error.
    pub fn fetch(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Fetch, url, op, source)
    }

    /// Create a Transport error.
    pub fn transport(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Transport, url, op, source)
    }

    /// Create a Timeout error.
    pub fn timeout(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Timeout, url, op, source)
    }

    /// Create a Response error.
    pub fn response(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Response, url, op, source)
    }

    /// Create a NoContent error.
    pub fn no_content(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::NoContent, url, op, source)
    }

    /// Returns true if this is a Configuration error.
    pub fn is_configuration(&self) -> bool {
        self.code == ErrorCode::Configuration
    }

    /// Returns true if this is an Input error.
    pub fn is_input(&self) -> bool {
        self.code == ErrorCode::Input
    }

    /// Returns true if this is a Fetch error.
    pub fn is_fetch(&self) -> bool {
        self.code == ErrorCode::Fetch
    }

    /// Returns true if this is a Timeout error.
    pub fn is_timeout(&self) -> bool {
        self.code == ErrorCode::Timeout
    }

    /// Returns true for every failure of an extraction strategy.
    pub fn is_extraction(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::Transport | ErrorCode::Timeout | ErrorCode::Response | ErrorCode::NoContent
        )
    }

    /// A message suitable for an end user. Never includes the underlying cause.
    pub fn user_message(&self) -> &'static str {
        match self.code {
            ErrorCode::Configuration => "The reader is not configured correctly. Check the API key in settings.",
            ErrorCode::Input => "No valid URL or page content provided to read.",
            ErrorCode::Fetch => "Cannot access page content. Ensure the page is accessible.",
            ErrorCode::Transport => "Failed to extract content with Gemini.",
            ErrorCode::Timeout => "Gemini took too long to respond.",
            ErrorCode::Response => "Gemini returned an unreadable response.",
            ErrorCode::NoContent => "Could not find readable content on this page.",
        }
    }
}
