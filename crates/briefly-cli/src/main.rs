use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use briefly_core::config_file::{self, ConfigFile};
use briefly_core::{
    ArticleFetcher, Config, HttpSummarizer, InputBundle, Outcome, Pipeline, UploadedFile,
    WORD_LENGTH_DEFAULT, WORD_LENGTH_MAX, WORD_LENGTH_MIN, estimate_bounds,
};
use briefly_pdf_mupdf::MupdfBackend;

mod output;

use output::ColorMode;

/// Briefly - Summarize text, web articles and PDFs with an abstractive model
#[derive(Parser, Debug)]
#[command(name = "briefly", version, about, long_about = None)]
struct Cli {
    /// Summarization endpoint URL (overrides config and BRIEFLY_ENDPOINT)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// API token sent as a bearer token (overrides config and env)
    #[arg(long, global = true)]
    api_token: Option<String>,

    /// Read configuration from this file instead of the default locations
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize pasted text, a web article or a PDF
    ///
    /// When several inputs are given, the PDF wins over the URL and the URL
    /// wins over the text.
    Summarize {
        /// Text to summarize
        #[arg(long, conflicts_with = "text_file")]
        text: Option<String>,

        /// Read the text to summarize from a file ("-" for stdin)
        #[arg(long)]
        text_file: Option<PathBuf>,

        /// Article URL (http or https)
        #[arg(long)]
        url: Option<String>,

        /// PDF file to summarize
        #[arg(long)]
        file: Option<PathBuf>,

        /// Target summary length in words
        #[arg(long, default_value_t = WORD_LENGTH_DEFAULT, value_parser = parse_words)]
        words: u32,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Show the token bounds used for a target word count
    Bounds {
        /// Target summary length in words
        #[arg(long, default_value_t = WORD_LENGTH_DEFAULT)]
        words: u32,
    },
}

fn parse_words(s: &str) -> Result<u32, String> {
    let words: u32 = s
        .parse()
        .map_err(|_| format!("`{}` is not a whole number", s))?;
    if !(WORD_LENGTH_MIN..=WORD_LENGTH_MAX).contains(&words) {
        return Err(format!(
            "must be between {} and {} words",
            WORD_LENGTH_MIN, WORD_LENGTH_MAX
        ));
    }
    Ok(words)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Bounds { words } => {
            output::print_bounds(&mut std::io::stdout(), words, estimate_bounds(words))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Summarize {
            text,
            text_file,
            url,
            file,
            words,
            no_color,
        } => {
            let file_config = match cli.config {
                Some(ref path) => config_file::load_required(path).map_err(anyhow::Error::msg)?,
                None => config_file::load_config(),
            };
            let config = resolve_config(&file_config, cli.endpoint, cli.api_token);

            let text = match text_file {
                Some(path) => Some(read_text(&path)?),
                None => text,
            };
            let file = file.as_deref().map(read_upload).transpose()?;

            let input = InputBundle {
                text,
                url,
                file,
                word_length: words,
            };
            let color = ColorMode(!no_color && std::io::stdout().is_terminal());
            summarize(&config, input, color).await
        }
    }
}

/// Layer CLI flags over environment and file configuration.
fn resolve_config(
    file: &ConfigFile,
    endpoint: Option<String>,
    api_token: Option<String>,
) -> Config {
    let mut config = Config::from_env(file);
    if let Some(endpoint) = endpoint {
        config.endpoint = endpoint;
    }
    if let Some(token) = api_token {
        config.api_token = Some(token);
    }
    tracing::debug!(?config, "resolved configuration");
    config
}

async fn summarize(config: &Config, input: InputBundle, color: ColorMode) -> anyhow::Result<ExitCode> {
    let spinner = output::spinner(std::io::stderr().is_terminal());

    spinner.set_message("Connecting to summarization backend...");
    let summarizer = match HttpSummarizer::connect(config).await {
        Ok(s) => s,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e).with_context(|| {
                format!("failed to initialize summarization backend at {}", config.endpoint)
            });
        }
    };

    let fetcher = match ArticleFetcher::new(config) {
        Ok(f) => f,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e).context("failed to build the article fetcher");
        }
    };
    let pipeline = Pipeline::new(Arc::new(summarizer), Arc::new(MupdfBackend::new()), fetcher);

    spinner.set_message("Summarizing...");
    let result = pipeline.run(input).await;
    spinner.finish_and_clear();

    let outcome = Outcome::of(&result);
    let markdown = briefly_core::render(&result);

    let mut stdout = std::io::stdout().lock();
    output::print_result(&mut stdout, &markdown, outcome, color)?;
    stdout.flush()?;

    Ok(match outcome {
        Outcome::Success | Outcome::Warning => ExitCode::SUCCESS,
        Outcome::Error => ExitCode::FAILURE,
    })
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        return std::io::read_to_string(std::io::stdin()).context("failed to read text from stdin");
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read text file {}", path.display()))
}

fn read_upload(path: &Path) -> anyhow::Result<UploadedFile> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    let data = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    Ok(UploadedFile::new(filename, data))
}
