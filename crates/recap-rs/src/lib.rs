//! Screen-session summarization core.
//!
//! `recap-rs` turns batches of screenshots into a running narrative of a
//! work session using an OpenAI-compatible vision chat API. Three pieces:
//!
//! - [`PromptClient`] — builds one multi-turn chat request (a system
//!   instruction, prior-summary context entries in assistant role, and a
//!   user turn carrying the new screenshots as inline images) and sends it
//!   with bounded retries on transient failures.
//! - [`summarize_batch`](summarize::summarize_batch) — folds a screenshot
//!   batch and the previous summary into a new timestamped summary
//!   artifact, returning its identity for chaining.
//! - [`reduce_session`](reduce::reduce_session) — combines every artifact
//!   of a session into one final summary.
//!
//! # Getting started
//!
//! ```ignore
//! use recap_rs::{PromptClient, reduce_session, summarize_batch};
//!
//! let client = PromptClient::from_env()?; // reads OPENAI_API_KEY
//!
//! // Summarize two batches, chaining the second onto the first.
//! let first = summarize_batch(&client, &batch_a, &summaries_dir, None).await?;
//! let second = summarize_batch(&client, &batch_b, &summaries_dir, Some(&first)).await?;
//!
//! // Reduce the whole session to one narrative.
//! reduce_session(&client, &summaries_dir, &final_path).await?;
//! ```
//!
//! # Continuity model
//!
//! Each summary call sees exactly one context entry: the immediately
//! preceding summary's text. Older history is carried forward only insofar
//! as it was absorbed into that text. This keeps every API call stateless
//! and bounded while the chain preserves task continuity.
//!
//! # Testing
//!
//! The HTTP transport sits behind the [`Transport`] trait, so retry
//! behavior and message assembly are unit-tested against fake transports
//! with canned status sequences — no network involved.

pub mod api;
pub mod error;
pub mod reduce;
pub mod summarize;

#[cfg(test)]
pub(crate) mod test_support;

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub use api::RetryConfig;
pub use error::Error;
pub use reduce::reduce_session;
pub use summarize::{SummaryId, summarize_batch};

// ── Constants ──────────────────────────────────────────────────────

pub const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default model for all summarization calls.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default response budget. Summaries are short task lists.
pub const DEFAULT_MAX_TOKENS: u32 = 300;

/// Per-call transport timeout, independent of the retry schedule.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable holding the API credential.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

// ── Request types ──────────────────────────────────────────────────

/// Role of a message in the conversation.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// One part of a message's content: text, or an inline-encoded image.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

/// An image reference. Always a `data:image/png;base64,...` URL here —
/// screenshots are encoded inline, never uploaded separately.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ImageUrl {
    pub url: String,
}

/// A message in the conversation.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Message {
    pub role: MessageRole,
    pub content: Vec<ContentPart>,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: vec![ContentPart::Text { text: text.into() }],
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: vec![ContentPart::Text { text: text.into() }],
        }
    }

    /// A user turn: instruction text followed by inline images, in order.
    pub fn user_with_images(text: impl Into<String>, image_urls: Vec<String>) -> Self {
        let mut content = Vec::with_capacity(image_urls.len() + 1);
        content.push(ContentPart::Text { text: text.into() });
        for url in image_urls {
            content.push(ContentPart::ImageUrl {
                image_url: ImageUrl { url },
            });
        }
        Self {
            role: MessageRole::User,
            content,
        }
    }
}

/// Chat completion request body.
#[derive(Serialize, Debug)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
}

// ── Response types ─────────────────────────────────────────────────

/// Raw API response (internal deserialization target).
#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: RawResponseMessage,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
}

// ── Transport ──────────────────────────────────────────────────────

/// Raw HTTP outcome: the request completed and produced a status and body.
/// Transport-level failure (connect error, timeout) is the `Err` side of
/// [`Transport::send`] instead.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// The wire under [`PromptClient`]. Production uses [`HttpTransport`];
/// tests substitute fakes with canned response sequences.
pub trait Transport {
    /// Post one chat request. `Err` means the request never completed.
    fn send(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<HttpResponse, String>> + Send;
}

/// Production transport: reqwest against the chat completions endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    api_key: String,
}

impl Transport for HttpTransport {
    async fn send(&self, request: &ChatRequest) -> Result<HttpResponse, String> {
        let start = Instant::now();

        let resp = self
            .client
            .post(OPENAI_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| format!("failed to read response: {e}"))?;

        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            body.len()
        );

        Ok(HttpResponse { status, body })
    }
}

// ── Client ─────────────────────────────────────────────────────────

/// Stateless chat client used by both summarization stages.
///
/// Owns the request-building and retry concerns; the filesystem side of
/// summarization lives in [`summarize`] and [`reduce`]. Nothing here
/// mutates local state — one call in, one text out.
pub struct PromptClient<T = HttpTransport> {
    transport: T,
    model: String,
    max_tokens: u32,
    retry: RetryConfig,
}

impl PromptClient<HttpTransport> {
    /// Create a client from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var(API_KEY_VAR)
            .map_err(|_| Error::Configuration(format!("{API_KEY_VAR} is not set")))?;
        Self::new(api_key)
    }

    /// Create a client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self, Error> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::Configuration(format!("{API_KEY_VAR} is empty")));
        }
        let client = reqwest::Client::builder()
            .user_agent("recap-rs/0.1")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_transport(HttpTransport { client, api_key }))
    }
}

impl<T: Transport> PromptClient<T> {
    /// Create a client over a custom transport. Defaults: [`DEFAULT_MODEL`],
    /// [`DEFAULT_MAX_TOKENS`], and the standard retry policy.
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            retry: RetryConfig::default(),
        }
    }

    /// Set the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the per-response token budget.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    /// Send one completion: a system instruction, prior-summary context
    /// entries (assistant role, in order), and a user turn combining the
    /// instruction text with all images inline-encoded, in order.
    ///
    /// Transient failures (connect errors, timeouts, HTTP 429/5xx) are
    /// retried with exponential backoff up to the attempt budget; other
    /// HTTP failures surface immediately as [`Error::Request`]. A 2xx
    /// payload missing `choices[0].message.content` is [`Error::Response`].
    pub async fn complete(
        &self,
        system: &str,
        user: &str,
        context: &[String],
        images: &[Vec<u8>],
    ) -> Result<String, Error> {
        let mut messages = Vec::with_capacity(context.len() + 2);
        messages.push(Message::system(system));
        for text in context {
            messages.push(Message::assistant(text));
        }
        let image_urls: Vec<String> = images
            .iter()
            .map(|bytes| {
                format!(
                    "data:image/png;base64,{}",
                    general_purpose::STANDARD.encode(bytes)
                )
            })
            .collect();
        messages.push(Message::user_with_images(user, image_urls));

        let body = ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
        };
        debug!(
            "LLM request: model={}, context entries={}, images={}",
            self.model,
            context.len(),
            images.len()
        );

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let (retryable, description) = match self.transport.send(&body).await {
                Ok(resp) if (200..300).contains(&resp.status) => {
                    return parse_completion(&resp.body);
                }
                Ok(resp) => {
                    let retryable = self.retry.retryable_status(resp.status);
                    (
                        retryable,
                        format!("HTTP {}: {}", resp.status, truncate(&resp.body)),
                    )
                }
                Err(e) => (true, e),
            };

            if !retryable {
                return Err(Error::Request(description));
            }
            if attempt >= self.retry.max_attempts {
                return Err(Error::Request(format!(
                    "{description} (after {attempt} attempts)"
                )));
            }
            let delay = self.retry.delay_for_attempt(attempt - 1);
            warn!(
                "Transient API error (attempt {attempt}/{}): {description}. Retrying in {delay:?}...",
                self.retry.max_attempts,
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// Extract the first choice's text content from a 2xx payload.
fn parse_completion(body: &str) -> Result<String, Error> {
    let parsed: RawChatResponse = serde_json::from_str(body)
        .map_err(|e| Error::Response(format!("failed to parse response: {e}")))?;
    parsed
        .choices
        .and_then(|choices| choices.into_iter().next())
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| Error::Response("response has no choices[0].message.content".to_string()))
}

/// First 200 chars of an error body, enough to diagnose without dumping it.
fn truncate(body: &str) -> String {
    body.chars().take(200).collect()
}

// ── Tests ──────────────────────────────────────────────────────────
