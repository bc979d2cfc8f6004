//! Client for the local text-generation relay.
//!
//! Two endpoints: one generates text from a prompt, the other receives
//! fire-and-forget context events.

use crate::config::RelayConfig;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Characters of an error body kept in `GenerationError::Status`
const BODY_SNIPPET_CHARS: usize = 200;

/// Failure of a generation request; `Display` is the message shown to the user
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("could not reach the generation relay: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("generation relay responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("generation relay sent a malformed response: {0}")]
    Malformed(String),
}

/// What the relay is asked to write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GenerationKind {
    /// A reply to the guest's latest message
    #[default]
    Reply,
    /// A listing description
    Description,
}

impl GenerationKind {
    /// Instruction appended to the context when the caller gives none
    pub fn default_instruction(&self) -> &'static str {
        match self {
            GenerationKind::Reply => {
                "Write a reply to the guest's latest message using the listing and calendar details above. Keep it polite, clear and professional."
            }
            GenerationKind::Description => {
                "Write an engaging listing description based on the listing details above."
            }
        }
    }

    fn action(&self) -> &'static str {
        match self {
            GenerationKind::Reply => "GENERATE_REPLY",
            GenerationKind::Description => "GENERATE_DESCRIPTION",
        }
    }
}

/// Builds the prompt text: the consolidated context, then the instruction
pub fn compose_prompt(context: &str, instruction: Option<&str>) -> String {
    match instruction.map(str::trim).filter(|i| !i.is_empty()) {
        Some(instruction) => format!("{}\n\n{}", context.trim_end(), instruction),
        None => context.to_string(),
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    text: &'a str,
    action: &'a str,
    context: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    reply: Option<String>,
}

#[derive(Debug, Serialize)]
struct ContextEvent<'a> {
    event: &'a str,
    context: &'a str,
    timestamp: String,
}

/// HTTP client for the generation relay
#[derive(Debug, Clone)]
pub struct RelayClient {
    client: reqwest::Client,
    generate_url: String,
    events_url: String,
}

impl RelayClient {
    pub fn new(config: &RelayConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let base = config.base_url.trim_end_matches('/');
        Ok(Self {
            client,
            generate_url: format!("{}{}", base, config.generate_path),
            events_url: format!("{}{}", base, config.events_path),
        })
    }

    /// Sends `prompt` to the relay and returns the generated text
    ///
    /// Never retried; the caller decides whether to ask again.
    pub async fn generate(&self, kind: GenerationKind, prompt: &str) -> Result<String, GenerationError> {
        ::log::info!("Requesting {:?} generation ({} chars of prompt)", kind, prompt.len());
        let request = GenerateRequest {
            text: prompt,
            action: kind.action(),
            context: prompt,
        };

        let response = self.client.post(&self.generate_url).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let snippet: String = body.chars().take(BODY_SNIPPET_CHARS).collect();
            ::log::error!("Generation relay returned {}: {}", status, snippet);
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: snippet,
            });
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| GenerationError::Malformed(e.to_string()))?;
        parsed
            .reply
            .ok_or_else(|| GenerationError::Malformed("missing \"reply\" field".to_string()))
    }

    /// Announces a newly received guest message together with the full context
    pub async fn post_event(&self, context: &str, timestamp: DateTime<Utc>) -> Result<(), GenerationError> {
        let event = ContextEvent {
            event: "MESSAGE_RECEIVED",
            context,
            timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        let response = self.client.post(&self.events_url).json(&event).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: String::new(),
            });
        }
        ::log::debug!("Relay acknowledged message event");
        Ok(())
    }
}
