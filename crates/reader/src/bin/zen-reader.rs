// ABOUTME: CLI binary for the Zen Reader content pipeline.
// ABOUTME: Reads URLs or HTML files and prints the sanitized article in various formats.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use zen_reader::{ContentType, ExtractError, ExtractedContent, Orchestrator, ReaderSettings};

#[derive(Parser, Debug)]
#[command(name = "zen-reader")]
#[command(about = "Extract the readable article from web pages")]
struct Args {
    /// Output format: html (default), markdown/md, text/txt
    #[arg(short = 'f', long = "format", default_value = "html")]
    format: String,

    /// Output file path (default: stdout)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Output the full article as JSON instead of the formatted content
    #[arg(long = "json")]
    json_output: bool,

    /// HTML file to read (requires --url)
    #[arg(long = "html")]
    html: Option<PathBuf>,

    /// Source URL for the HTML file (required with --html)
    #[arg(long = "url")]
    url: Option<String>,

    /// Gemini API key; overrides the key from --settings
    #[arg(long = "api-key", env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Reader settings JSON file
    #[arg(long = "settings")]
    settings: Option<PathBuf>,

    /// Gemini model name
    #[arg(long = "model")]
    model: Option<String>,

    /// Gemini endpoint base URL
    #[arg(long = "endpoint")]
    endpoint: Option<String>,

    /// Deadline for the model call, in seconds
    #[arg(long = "ai-timeout")]
    ai_timeout: Option<u64>,

    /// Print elapsed time in ms to stderr
    #[arg(long = "timing")]
    timing: bool,

    /// Allow fetching from private/local networks
    #[arg(long = "allow-private-networks")]
    allow_private_networks: bool,

    /// URLs to read (fetch mode)
    #[arg()]
    urls: Vec<String>,
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn render(article: &ExtractedContent, content_type: ContentType) -> String {
    match content_type {
        ContentType::Html => article.content.clone(),
        ContentType::Markdown => article.format_markdown(),
        ContentType::Text => article.text(),
    }
}

/// Format output as JSON or as the rendered content of each article.
fn format_output(
    articles: &[ExtractedContent],
    content_type: ContentType,
    json_output: bool,
) -> Result<String, serde_json::Error> {
    if json_output {
        return match articles {
            [single] => serde_json::to_string_pretty(single),
            many => serde_json::to_string_pretty(many),
        };
    }

    Ok(articles
        .iter()
        .map(|a| render(a, content_type))
        .collect::<Vec<_>>()
        .join("\n\n"))
}

fn report(target: &str, err: &ExtractError) {
    tracing::debug!(error = %err, cause = ?err.source, "extraction failed");
    eprintln!("error: {}: {}", target, err.user_message());
}

fn load_settings(args: &Args) -> Result<ReaderSettings, ExtractError> {
    let mut settings = match &args.settings {
        Some(path) => ReaderSettings::load(path)?,
        None => ReaderSettings::default(),
    };
    if let Some(key) = &args.api_key {
        settings.gemini_api_key = key.clone();
    }
    Ok(settings)
}

fn build_orchestrator(args: &Args) -> Result<Orchestrator, ExtractError> {
    let mut builder =
        Orchestrator::builder().allow_private_networks(args.allow_private_networks);
    if let Some(model) = &args.model {
        builder = builder.model(model.clone());
    }
    if let Some(endpoint) = &args.endpoint {
        builder = builder.endpoint(endpoint.clone());
    }
    if let Some(secs) = args.ai_timeout {
        builder = builder.ai_timeout(Duration::from_secs(secs));
    }
    builder.build()
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging();

    if args.html.is_some() && args.url.is_none() {
        eprintln!("error: --url is required when using --html");
        return ExitCode::from(1);
    }

    if args.html.is_none() && args.urls.is_empty() {
        eprintln!("error: at least one URL is required, or use --html with --url");
        return ExitCode::from(1);
    }

    if args.html.is_some() && !args.urls.is_empty() {
        eprintln!("error: cannot use both --html and positional URLs");
        return ExitCode::from(1);
    }

    let settings = match load_settings(&args) {
        Ok(settings) => settings,
        Err(e) => {
            report("settings", &e);
            return ExitCode::from(1);
        }
    };

    let orchestrator = match build_orchestrator(&args) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            report("setup", &e);
            return ExitCode::from(1);
        }
    };

    let content_type = ContentType::from(args.format.as_str());
    let start = Instant::now();
    let mut articles: Vec<ExtractedContent> = Vec::new();
    let mut had_error = false;

    if let (Some(html_path), Some(url)) = (&args.html, &args.url) {
        match fs::read_to_string(html_path) {
            Ok(html) => match orchestrator
                .resolve_content(url, &html, settings.credential())
                .await
            {
                Ok(article) => articles.push(article.sanitized()),
                Err(e) => {
                    report(url, &e);
                    had_error = true;
                }
            },
            Err(e) => {
                eprintln!("error reading file {:?}: {}", html_path, e);
                had_error = true;
            }
        }
    } else {
        for url in &args.urls {
            match orchestrator.read(url, &settings).await {
                Ok(article) => articles.push(article.sanitized()),
                Err(e) => {
                    report(url, &e);
                    had_error = true;
                }
            }
        }
    }

    let elapsed = start.elapsed();

    if !articles.is_empty() {
        match format_output(&articles, content_type, args.json_output) {
            Ok(output_str) => {
                if let Some(output_path) = &args.output {
                    if let Err(e) = fs::write(output_path, &output_str) {
                        eprintln!("error writing to {:?}: {}", output_path, e);
                        had_error = true;
                    }
                } else {
                    println!("{}", output_str);
                }
            }
            Err(e) => {
                eprintln!("error encoding output: {}", e);
                had_error = true;
            }
        }
    }

    if args.timing {
        let _ = writeln!(io::stderr(), "elapsed: {}ms", elapsed.as_millis());
    }

    if had_error {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
