// ABOUTME: Main library entry point for the Zen Reader content pipeline.
// ABOUTME: Re-exports the public API: Orchestrator, OrchestratorBuilder, ExtractedContent, ExtractError, ErrorCode, ReaderSettings.

//! Zen Reader - turns a cluttered web page into a clean, readable article.
//!
//! Two extraction strategies are available. The AI strategy asks a remote
//! Gemini model for the article; the heuristic strategy scores the parsed
//! DOM the way readability tools do. The [`Orchestrator`] tries AI first when
//! a credential is configured and falls back to the heuristic otherwise.
//!
//! # Example
//!
//! ```no_run
//! use zen_reader::{ExtractError, Orchestrator, ReaderSettings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ExtractError> {
//!     let orchestrator = Orchestrator::builder().build()?;
//!     let settings = ReaderSettings::default();
//!     let article = orchestrator
//!         .read("https://example.com/article", &settings)
//!         .await?;
//!     println!("{}", article.sanitized().format_markdown());
//!     Ok(())
//! }
//! ```

pub mod ai;
pub mod content;
pub mod error;
pub mod formats;
pub mod heuristic;
pub mod options;
pub mod orchestrator;
pub mod resource;
pub mod settings;

pub use crate::ai::AiExtractor;
pub use crate::content::ExtractedContent;
pub use crate::error::{ErrorCode, ExtractError, Result};
pub use crate::formats::{sanitize_html, ContentType};
pub use crate::heuristic::HeuristicExtractor;
pub use crate::options::{AiOptions, Options, OrchestratorBuilder};
pub use crate::orchestrator::Orchestrator;
pub use crate::settings::{ReaderSettings, Theme};
