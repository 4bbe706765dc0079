//! HTTP client for the external text-generation collaborator.
//!
//! Speaks the OpenAI-compatible chat-completions shape: one request per
//! prompt, no caching, identical prompts may yield different prose. All
//! connection settings are injected at construction; nothing is read from
//! ambient process state.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::StatusCode;
use tracing::{debug, instrument, warn};
use url::Url;

use contractforge_shared::{ContractForgeError, GenerationConfig, Result};

/// User-Agent string for generation requests.
const USER_AGENT: &str = concat!("ContractForge/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// TextGenerator trait
// ---------------------------------------------------------------------------

/// Narrow contract for the text-generation collaborator: one prompt and a
/// max-length hint in, generated text out. Any API fulfilling this is
/// interchangeable, and tests use deterministic stand-ins.
pub trait TextGenerator {
    /// One network call per invocation. Returns `GenerationUnavailable` when
    /// the collaborator cannot be reached or keeps failing, and
    /// `GenerationEmpty` when it answers with blank or malformed text.
    fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
    ) -> impl Future<Output = Result<String>> + Send;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, serde::Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, serde::Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, serde::Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, serde::Deserialize)]
struct ChatResponseMessage {
    content: String,
}

// ---------------------------------------------------------------------------
// GeneratorClient
// ---------------------------------------------------------------------------

/// Connection settings for [`GeneratorClient`], resolved from the app config
/// plus the API key from its env var.
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub endpoint: Url,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    /// Bounded retries for rate-limit (429) and server (5xx) responses.
    pub retry_attempts: u32,
    /// Initial backoff; doubles on each retry.
    pub retry_backoff: Duration,
}

impl GeneratorSettings {
    /// Build settings from the `[generation]` config section and a resolved key.
    pub fn from_config(config: &GenerationConfig, api_key: String) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            ContractForgeError::configuration(format!(
                "invalid generation endpoint '{}': {e}",
                config.endpoint
            ))
        })?;

        Ok(Self {
            endpoint,
            api_key,
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            retry_attempts: config.retry_attempts,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }
}

/// Client for the text-generation collaborator.
pub struct GeneratorClient {
    http: reqwest::Client,
    settings: GeneratorSettings,
}

impl GeneratorClient {
    pub fn new(settings: GeneratorSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| {
                ContractForgeError::GenerationUnavailable(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { http, settings })
    }

    /// Send one chat-completions request.
    async fn request_once(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let body = ChatRequest {
            model: &self.settings.model,
            max_tokens,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(self.settings.endpoint.clone())
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ContractForgeError::GenerationUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContractForgeError::GenerationUnavailable(format!(
                "HTTP {status} from {}",
                self.settings.endpoint
            )));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            ContractForgeError::GenerationEmpty(format!("malformed response body: {e}"))
        })?;

        match parsed.choices.into_iter().next() {
            Some(choice) => Ok(choice.message.content),
            None => Err(ContractForgeError::GenerationEmpty(
                "response contained no choices".into(),
            )),
        }
    }

    /// Whether a failed attempt is worth retrying: rate-limit and server
    /// errors are; client errors and auth failures are not.
    fn is_retryable(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }
}

impl TextGenerator for GeneratorClient {
    #[instrument(skip_all, fields(model = %self.settings.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let mut backoff = self.settings.retry_backoff;
        let mut attempt = 0u32;

        loop {
            match self.request_once(prompt, max_tokens).await {
                Ok(raw) => {
                    let text = postprocess(&raw);
                    if text.is_empty() {
                        return Err(ContractForgeError::GenerationEmpty(
                            "collaborator returned blank text".into(),
                        ));
                    }
                    debug!(chars = text.len(), "generation complete");
                    return Ok(text);
                }
                Err(ContractForgeError::GenerationUnavailable(msg)) => {
                    let retryable = parse_status(&msg)
                        .map(Self::is_retryable)
                        // Transport-level failures (no status) get retried too.
                        .unwrap_or(true);

                    if !retryable || attempt >= self.settings.retry_attempts {
                        return Err(ContractForgeError::GenerationUnavailable(msg));
                    }

                    attempt += 1;
                    warn!(attempt, error = %msg, "generation call failed, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(other) => return Err(other),
            }
        }
    }
}

/// Extract the HTTP status from a `GenerationUnavailable` message, if present.
fn parse_status(msg: &str) -> Option<StatusCode> {
    let rest = msg.strip_prefix("HTTP ")?;
    let code = rest.split_whitespace().next()?;
    code.parse::<u16>().ok().and_then(|c| StatusCode::from_u16(c).ok())
}

// ---------------------------------------------------------------------------
// Post-processing
// ---------------------------------------------------------------------------

static HEADING_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]*").expect("valid regex"));

static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Light post-processing of generated prose: normalize line endings, collapse
/// all `#`-marked heading levels to a single `## ` level, squeeze runs of
/// blank lines, and trim.
pub fn postprocess(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n");
    let text = HEADING_MARKER.replace_all(&text, "## ");
    let text = BLANK_RUNS.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Deterministic fallback paragraph substituted when generation yields no
/// usable content, so the document stays structurally valid.
pub fn placeholder_text(section_title: &str) -> String {
    format!(
        "Standard {section_title} provisions apply to this agreement. The complete \
         {section_title} language will be incorporated into the executed copy of this \
         contract as approved by the contracting agency and the provider."
    )
}
