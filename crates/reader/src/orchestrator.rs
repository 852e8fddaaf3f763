// ABOUTME: The Orchestrator that runs the AI strategy first and falls back to the heuristic extractor.
// ABOUTME: Owns the HTTP client, fetches pages, parses HTML and normalizes the final article.

use std::net::ToSocketAddrs;

use scraper::Html;
use url::Url;

use crate::ai::AiExtractor;
use crate::content::ExtractedContent;
use crate::error::ExtractError;
use crate::heuristic::{metadata, HeuristicExtractor};
use crate::options::{Options, OrchestratorBuilder};
use crate::resource::{fetch, is_private_ip, FetchOptions, FetchResult};
use crate::settings::ReaderSettings;

/// Resolves raw pages into articles.
///
/// Strategies run strictly one after the other: AI when a credential is
/// supplied, then the heuristic extractor on the same HTML. Nothing is cached
/// between calls.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    opts: Options,
    http_client: reqwest::Client,
}

fn redirect_policy(allow_private: bool) -> reqwest::redirect::Policy {
    reqwest::redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() > 10 {
            return attempt.error("too many redirects");
        }
        if allow_private {
            return attempt.follow();
        }

        let next = attempt.url().clone();
        let Some(host) = next.host_str() else {
            return attempt.follow();
        };
        let host = host.trim_start_matches('[').trim_end_matches(']');

        if let Ok(ip) = host.parse::<std::net::IpAddr>() {
            if is_private_ip(&ip) {
                return attempt.error("redirect to private IP blocked");
            }
            return attempt.follow();
        }

        // Redirect policies are synchronous, so resolve with the blocking resolver.
        let port = next.port_or_known_default().unwrap_or(80);
        match (host, port).to_socket_addrs() {
            Ok(mut addrs) => {
                if addrs.any(|sa| is_private_ip(&sa.ip())) {
                    attempt.error("redirect to private IP blocked")
                } else {
                    attempt.follow()
                }
            }
            Err(_) => attempt.error("DNS lookup failed during redirect"),
        }
    })
}

impl Orchestrator {
    /// Create a new OrchestratorBuilder for configuring the orchestrator.
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Create a new Orchestrator with the given options.
    pub fn new(opts: Options) -> Result<Self, ExtractError> {
        let http_client = match opts.http_client.clone() {
            Some(client) => client,
            None => reqwest::Client::builder()
                .redirect(redirect_policy(opts.allow_private_networks))
                .user_agent(&opts.user_agent)
                .timeout(opts.timeout)
                .gzip(true)
                .brotli(true)
                .deflate(true)
                .build()
                .map_err(|e| ExtractError::configuration("NewOrchestrator", Some(e.into())))?,
        };

        Ok(Self { opts, http_client })
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    /// Fetch a page with the configured headers and network policy.
    pub async fn fetch_page(&self, url: &str) -> Result<FetchResult, ExtractError> {
        let fetch_opts = FetchOptions {
            headers: self.opts.headers.clone(),
            allow_private_networks: self.opts.allow_private_networks,
            parse_non_2xx: false,
        };
        fetch(&self.http_client, url, &fetch_opts).await
    }

    /// Fetch `url` and resolve its content with the credential from `settings`.
    pub async fn read(
        &self,
        url: &str,
        settings: &ReaderSettings,
    ) -> Result<ExtractedContent, ExtractError> {
        let page = self.fetch_page(url).await?;
        let html = page.text_utf8();
        self.resolve_content(&page.final_url, &html, settings.credential())
            .await
    }

    /// Turn already-fetched HTML into an article.
    ///
    /// With a non-blank `credential` the AI strategy runs first; any failure is
    /// logged and the heuristic extractor runs on the same HTML. When the
    /// heuristic also fails, its error is returned and the AI error is only
    /// in the log.
    pub async fn resolve_content(
        &self,
        source_url: &str,
        fetched_html: &str,
        credential: Option<&str>,
    ) -> Result<ExtractedContent, ExtractError> {
        if source_url.trim().is_empty() {
            return Err(ExtractError::input(
                source_url,
                "ResolveContent",
                Some(anyhow::anyhow!("no source URL")),
            ));
        }
        if fetched_html.trim().is_empty() {
            return Err(ExtractError::input(
                source_url,
                "ResolveContent",
                Some(anyhow::anyhow!("no page content")),
            ));
        }

        let base_url = Url::parse(source_url).ok();

        match credential.map(str::trim).filter(|c| !c.is_empty()) {
            Some(credential) => match self.extract_with_ai(credential, source_url, fetched_html).await {
                Ok(article) => {
                    tracing::info!(url = source_url, strategy = "ai", "resolved content");
                    let fallback = page_title(fetched_html, base_url.as_ref());
                    return Ok(article.normalized(fallback));
                }
                Err(err) => {
                    tracing::warn!(
                        url = source_url,
                        error = %err,
                        cause = ?err.source,
                        "AI extraction failed, falling back to heuristic"
                    );
                }
            },
            None => tracing::debug!(url = source_url, "no credential, skipping AI extraction"),
        }

        let document = Html::parse_document(fetched_html);
        let extractor = match base_url {
            Some(url) => HeuristicExtractor::new().with_base_url(url),
            None => HeuristicExtractor::new(),
        };

        let article = extractor.extract(&document).map_err(|err| {
            tracing::debug!(url = source_url, error = %err, "heuristic extraction failed");
            err
        })?;

        tracing::info!(url = source_url, strategy = "heuristic", "resolved content");
        Ok(article)
    }

    async fn extract_with_ai(
        &self,
        credential: &str,
        source_url: &str,
        html: &str,
    ) -> Result<ExtractedContent, ExtractError> {
        let extractor = AiExtractor::new(credential, &self.opts.ai, self.http_client.clone())?;
        extractor.extract(html, source_url).await
    }
}

/// Title used when the model returns a blank one: the page's own title, then the host.
fn page_title(html: &str, base_url: Option<&Url>) -> Option<String> {
    metadata::collect(&Html::parse_document(html))
        .title
        .or_else(|| base_url.and_then(Url::host_str).map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const ARTICLE: &str = r#"<html><head><title>Test Page Title</title></head><body>
        <article><h1>Main Article Title</h1>
        <p>First paragraph of the article content.</p>
        <p>Second paragraph.</p></article></body></html>"#;

    fn model_reply(text: &str) -> String {
        json!({"candidates": [{"content": {"parts": [{"text": text}]}}]}).to_string()
    }

    fn orchestrator_for(server: &MockServer) -> Orchestrator {
        Orchestrator::builder()
            .endpoint(server.base_url())
            .allow_private_networks(true)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn ai_success_is_returned() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v1beta/models/gemini-pro:generateContent");
            then.status(200)
                .header("content-type", "application/json")
                .body(model_reply(r#"{"title":"AI Title","content":"<p>AI body</p>"}"#));
        });

        let article = orchestrator_for(&server)
            .resolve_content("https://example.com/a", ARTICLE, Some("key"))
            .await
            .unwrap();

        mock.assert();
        assert_eq!(article.title, "AI Title");
        assert_eq!(article.content, "<p>AI body</p>");
    }

    #[tokio::test]
    async fn ai_blank_title_uses_page_title() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(200)
                .header("content-type", "application/json")
                .body(model_reply(r#"{"title":"  ","content":"<p>AI body</p>"}"#));
        });

        let article = orchestrator_for(&server)
            .resolve_content("https://example.com/a", ARTICLE, Some("key"))
            .await
            .unwrap();

        assert_eq!(article.title, "Test Page Title");
    }

    #[tokio::test]
    async fn transport_failure_falls_back_to_heuristic() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST);
            then.status(503).body("overloaded");
        });

        let article = orchestrator_for(&server)
            .resolve_content("https://example.com/a", ARTICLE, Some("key"))
            .await
            .unwrap();

        mock.assert_hits(1);
        assert!(article.content.contains("First paragraph of the article content."));
        assert_eq!(article.title, "Test Page Title");
    }

    #[tokio::test]
    async fn malformed_reply_falls_back_to_heuristic() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(200)
                .header("content-type", "application/json")
                .body(model_reply("not json at all"));
        });

        let article = orchestrator_for(&server)
            .resolve_content("https://example.com/a", ARTICLE, Some("key"))
            .await
            .unwrap();

        assert!(article.content.contains("First paragraph"));
    }

    #[tokio::test]
    async fn ai_timeout_longer_than_fetch_timeout_is_honored() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(200)
                .delay(std::time::Duration::from_millis(800))
                .header("content-type", "application/json")
                .body(model_reply(r#"{"title":"AI","content":"<p>AI body</p>"}"#));
        });

        let orchestrator = Orchestrator::builder()
            .endpoint(server.base_url())
            .allow_private_networks(true)
            .timeout(std::time::Duration::from_millis(300))
            .ai_timeout(std::time::Duration::from_secs(5))
            .build()
            .unwrap();

        let article = orchestrator
            .resolve_content("https://example.com/a", ARTICLE, Some("key"))
            .await
            .unwrap();

        assert_eq!(article.title, "AI");
        assert_eq!(article.content, "<p>AI body</p>");
    }

    #[tokio::test]
    async fn both_failing_returns_heuristic_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(500);
        });

        let err = orchestrator_for(&server)
            .resolve_content("https://example.com/a", "<html><body></body></html>", Some("key"))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::NoContent);
        assert_eq!(err.op, "Readability");
    }

    #[tokio::test]
    async fn missing_credential_skips_ai() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST);
            then.status(200).body(model_reply("{}"));
        });
        let orchestrator = orchestrator_for(&server);

        for credential in [None, Some(""), Some("   ")] {
            let article = orchestrator
                .resolve_content("https://example.com/a", ARTICLE, credential)
                .await
                .unwrap();
            assert!(article.content.contains("First paragraph"));
        }

        mock.assert_hits(0);
    }

    #[tokio::test]
    async fn blank_inputs_are_rejected() {
        let orchestrator = Orchestrator::builder().build().unwrap();

        let err = orchestrator.resolve_content("", ARTICLE, None).await.unwrap_err();
        assert!(err.is_input());

        let err = orchestrator
            .resolve_content("https://example.com", "  ", None)
            .await
            .unwrap_err();
        assert!(err.is_input());
    }

    #[tokio::test]
    async fn read_fetches_and_extracts() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/post");
            then.status(200)
                .header("content-type", "text/html; charset=utf-8")
                .body(ARTICLE);
        });

        let article = orchestrator_for(&server)
            .read(&server.url("/post"), &ReaderSettings::default())
            .await
            .unwrap();

        assert_eq!(article.title, "Test Page Title");
        assert!(article.content.contains("First paragraph"));
    }

    #[tokio::test]
    async fn read_reports_unreachable_pages() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/gone");
            then.status(404);
        });

        let err = orchestrator_for(&server)
            .read(&server.url("/gone"), &ReaderSettings::default())
            .await
            .unwrap_err();

        assert!(err.is_fetch());
        assert_eq!(
            err.user_message(),
            "Cannot access page content. Ensure the page is accessible."
        );
    }
}
