//! Summarization through a Hugging Face style inference endpoint.
//!
//! Speaks the `summarization` task of the Inference API: the request carries
//! the input text plus generation parameters, the response is a list of
//! `{"summary_text": ...}` objects. Self-hosted servers exposing the same
//! shape work too.

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::{Summarizer, SummarizerError};
use crate::{Config, LengthBounds};

/// Passage sent once at startup to confirm the model is loaded and answering.
const PROBE_TEXT: &str = "The city council met on Tuesday to discuss the new public library. \
    Members agreed that the building should open next spring, after a short delay caused by \
    supply problems. The library will offer longer opening hours, a children's reading room \
    and free internet access for all residents.";

/// Longest error body kept in [`SummarizerError::Status`].
const MAX_ERROR_BODY: usize = 300;

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
    options: InferenceOptions,
}

#[derive(Serialize)]
struct GenerationParameters {
    min_length: u32,
    max_length: u32,
    do_sample: bool,
}

#[derive(Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    List(Vec<SummaryItem>),
    Single(SummaryItem),
    Error { error: String },
}

#[derive(Deserialize)]
struct SummaryItem {
    summary_text: String,
}

/// A remote summarization model reached over HTTP.
pub struct HttpSummarizer {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_token: Option<String>,
}

impl HttpSummarizer {
    /// Build the client without contacting the endpoint.
    pub fn new(config: &Config) -> Result<Self, SummarizerError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.backend_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_token: config.api_token.clone(),
        })
    }

    /// Build the client and run a probe summarization.
    ///
    /// This is the one-time model initialization step: callers treat an
    /// error as fatal.
    pub async fn connect(config: &Config) -> Result<Self, SummarizerError> {
        let summarizer = Self::new(config)?;
        let start = Instant::now();
        summarizer.probe().await?;
        tracing::info!(
            model = %summarizer.model,
            endpoint = %summarizer.endpoint,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "summarization backend ready"
        );
        Ok(summarizer)
    }

    /// Send a short fixed passage through the model.
    pub async fn probe(&self) -> Result<(), SummarizerError> {
        let bounds = LengthBounds {
            min_tokens: 5,
            max_tokens: 30,
        };
        self.request(PROBE_TEXT, bounds).await.map(|_| ())
    }

    async fn request(&self, text: &str, bounds: LengthBounds) -> Result<String, SummarizerError> {
        let sent = if bounds.is_inverted() {
            tracing::warn!(
                min_tokens = bounds.min_tokens,
                max_tokens = bounds.max_tokens,
                "inverted length bounds, clamping min_tokens to max_tokens"
            );
            bounds.clamped()
        } else {
            bounds
        };

        let body = InferenceRequest {
            inputs: text,
            parameters: GenerationParameters {
                min_length: sent.min_tokens,
                max_length: sent.max_tokens,
                do_sample: false,
            },
            options: InferenceOptions {
                wait_for_model: true,
            },
        };

        let mut req = self.client.post(&self.endpoint).json(&body);
        if let Some(ref token) = self.api_token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let payload = resp.text().await?;
        parse_response(status, &payload)
    }
}

/// Interpret an inference response body.
fn parse_response(status: u16, payload: &str) -> Result<String, SummarizerError> {
    if !(200..300).contains(&status) {
        #[derive(Deserialize)]
        struct ApiError {
            error: String,
        }
        let body = match serde_json::from_str::<ApiError>(payload) {
            Ok(e) => e.error,
            Err(_) => truncate(payload.trim(), MAX_ERROR_BODY),
        };
        return Err(SummarizerError::Status { status, body });
    }

    let parsed: InferenceResponse =
        serde_json::from_str(payload).map_err(|e| SummarizerError::Malformed(e.to_string()))?;

    let summary = match parsed {
        InferenceResponse::List(items) => items
            .into_iter()
            .next()
            .map(|item| item.summary_text)
            .ok_or_else(|| SummarizerError::Malformed("empty result list".into()))?,
        InferenceResponse::Single(item) => item.summary_text,
        InferenceResponse::Error { error } => return Err(SummarizerError::Api(error)),
    };

    let summary = summary.trim();
    if summary.is_empty() {
        return Err(SummarizerError::EmptyOutput);
    }
    Ok(summary.to_string())
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

impl Summarizer for HttpSummarizer {
    fn name(&self) -> &str {
        &self.model
    }

    fn summarize<'a>(
        &'a self,
        text: &'a str,
        bounds: LengthBounds,
    ) -> Pin<Box<dyn Future<Output = Result<String, SummarizerError>> + Send + 'a>> {
        Box::pin(self.request(text, bounds))
    }
}
