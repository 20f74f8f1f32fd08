//! The Oracle: AI rules assistant
//!
//! Provides:
//! - LLM chat completions via an OpenAI-compatible API
//! - Rate limiting per caller
//! - In-character apologies instead of errors
//!
//! Callers see [`Oracle::ask`], which never fails.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::OracleConfig;
use crate::rules::KNOWLEDGE_BASE;

/// Answer when no API key is configured
pub const NOT_CONFIGURED_REPLY: &str = "The Oracle is not configured (missing API key).";
/// Answer when the provider returned nothing usable
pub const SILENT_REPLY: &str = "The Oracle remains silent (empty response).";
/// Answer when the provider could not be reached
pub const UNREACHABLE_REPLY: &str = "The Oracle could not reach the higher planes right now.";
/// Answer when the caller asked too often
pub const RATE_LIMITED_REPLY: &str = "The Oracle needs a moment of rest. Ask again shortly.";

/// Caller key used when none is given
const DEFAULT_CALLER: &str = "table";

/// Single-shot question answering
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Answer a question given table context. Never fails.
    async fn ask(&self, question: &str, context: &str) -> String;
}

/// Oracle failures, mapped to apologies by [`OracleClient::ask_as`]
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("API key not configured")]
    NotConfigured,
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {0}")]
    Status(u16),
    #[error("empty response")]
    Empty,
}

impl OracleError {
    /// In-character reply shown at the table
    pub fn apology(&self) -> &'static str {
        match self {
            OracleError::NotConfigured => NOT_CONFIGURED_REPLY,
            OracleError::RateLimited => RATE_LIMITED_REPLY,
            OracleError::Empty => SILENT_REPLY,
            OracleError::Request(_) | OracleError::Status(_) => UNREACHABLE_REPLY,
        }
    }
}

/// Completion message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<PromptMessage>,
    max_tokens: u32,
    temperature: f32,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: PromptMessage,
}

/// Rate limiter using token bucket algorithm
#[derive(Debug)]
pub struct RateLimiter {
    /// Tokens per caller: caller -> (tokens, last_refill)
    buckets: RwLock<HashMap<String, (u32, Instant)>>,
    /// Max tokens per bucket
    max_tokens: u32,
    /// Refill rate (tokens per second)
    refill_rate: f32,
}

impl RateLimiter {
    /// Create a limiter allowing `per_minute` requests per caller
    pub fn per_minute(per_minute: u32) -> Self {
        let per_minute = per_minute.max(1);
        Self {
            buckets: RwLock::new(HashMap::new()),
            max_tokens: per_minute,
            refill_rate: per_minute as f32 / 60.0,
        }
    }

    /// Consume a token (returns false if rate limited)
    pub async fn consume(&self, caller: &str) -> bool {
        let mut buckets = self.buckets.write().await;
        let now = Instant::now();

        let (tokens, last_refill) = buckets
            .entry(caller.to_string())
            .or_insert((self.max_tokens, now));

        let elapsed = last_refill.elapsed().as_secs_f32();
        let refilled = (*tokens as f32 + elapsed * self.refill_rate).min(self.max_tokens as f32);

        if refilled >= 1.0 {
            *tokens = (refilled - 1.0) as u32;
            *last_refill = now;
            true
        } else {
            false
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::per_minute(60)
    }
}

/// Build the system prompt for a table context
pub fn system_prompt(context: &str) -> String {
    format!(
        "You are the \"Oracle\", an experienced and helpful game master assistant for \
         Old Dragon 2e.\n\
         Use the following knowledge base to answer rules questions:\n\
         {}\n\
         Current table context: {}\n\n\
         For rules questions, be direct and cite the rule. For creative requests \
         (a name, a room description), be evocative and old school, focused on \
         exploration and danger. Keep answers short enough for a chat.",
        KNOWLEDGE_BASE, context
    )
}

/// LLM-backed Oracle
#[derive(Debug)]
pub struct OracleClient {
    client: Client,
    config: OracleConfig,
    rate_limiter: RateLimiter,
}

impl OracleClient {
    pub fn new(config: OracleConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            rate_limiter: RateLimiter::per_minute(config.requests_per_minute),
            config,
        }
    }

    /// Create a shared instance
    pub fn shared(config: OracleConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    /// Check if API key is configured
    pub fn is_configured(&self) -> bool {
        self.config.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Send a completion request on behalf of `caller`
    pub async fn complete(
        &self,
        caller: &str,
        question: &str,
        context: &str,
    ) -> Result<String, OracleError> {
        let api_key = match self.config.api_key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => return Err(OracleError::NotConfigured),
        };

        if !self.rate_limiter.consume(caller).await {
            return Err(OracleError::RateLimited);
        }

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                PromptMessage::system(&system_prompt(context)),
                PromptMessage::user(question),
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!("Sending Oracle request with model {}", request.model);

        let response = self
            .client
            .post(format!(
                "{}/chat/completions",
                self.config.base_url.trim_end_matches('/')
            ))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Oracle API error: {} - {}", status, body);
            return Err(OracleError::Status(status.as_u16()));
        }

        let chat_response: ChatResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(OracleError::Empty)
    }

    /// Ask on behalf of `caller`, replacing any failure with an apology
    pub async fn ask_as(&self, caller: &str, question: &str, context: &str) -> String {
        match self.complete(caller, question, context).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Oracle request failed: {}", e);
                e.apology().to_string()
            }
        }
    }
}

#[async_trait]
impl Oracle for OracleClient {
    async fn ask(&self, question: &str, context: &str) -> String {
        self.ask_as(DEFAULT_CALLER, question, context).await
    }
}

/// Oracle reached through a tavernd server's `/api/oracle` endpoint
pub struct RemoteOracle {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct OracleQuery<'a> {
    question: &'a str,
    context: &'a str,
}

#[derive(Deserialize)]
struct OracleAnswer {
    answer: String,
}

impl RemoteOracle {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:3001`
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn query(&self, question: &str, context: &str) -> Result<String, OracleError> {
        let response = self
            .client
            .post(format!("{}/api/oracle", self.base_url))
            .json(&OracleQuery { question, context })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(OracleError::Status(response.status().as_u16()));
        }
        let answer: OracleAnswer = response.json().await?;
        Ok(answer.answer)
    }
}

#[async_trait]
impl Oracle for RemoteOracle {
    async fn ask(&self, question: &str, context: &str) -> String {
        match self.query(question, context).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Remote Oracle failed: {}", e);
                e.apology().to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limiter_allows_initial() {
        let limiter = RateLimiter::default();
        assert!(limiter.consume("user1").await);
    }

    #[tokio::test]
    async fn test_rate_limiter_exhaustion() {
        let limiter = RateLimiter::per_minute(2);

        assert!(limiter.consume("user1").await);
        assert!(limiter.consume("user1").await);
        assert!(!limiter.consume("user1").await);

        // Buckets are per caller
        assert!(limiter.consume("user2").await);
    }

    #[tokio::test]
    async fn test_not_configured_apologizes() {
        let client = OracleClient::new(OracleConfig::default());
        assert!(!client.is_configured());
        let answer = client.ask("How does AC work?", "").await;
        assert_eq!(answer, NOT_CONFIGURED_REPLY);
    }

    #[tokio::test]
    async fn test_unreachable_apologizes() {
        let config = OracleConfig {
            api_key: Some("test-key".to_string()),
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 2,
            ..OracleConfig::default()
        };
        let client = OracleClient::new(config);
        assert!(client.is_configured());
        let answer = client.ask("Hello?", "").await;
        assert_eq!(answer, UNREACHABLE_REPLY);
    }

    #[test]
    fn test_system_prompt_includes_context() {
        let prompt = system_prompt("Game master: Lady Dice.");
        assert!(prompt.contains("Lady Dice"));
        assert!(prompt.contains("MODIFIERS"));
    }

    #[tokio::test]
    async fn test_remote_oracle_unreachable_apologizes() {
        let oracle = RemoteOracle::new("http://127.0.0.1:1/");
        assert_eq!(oracle.ask("?", "").await, UNREACHABLE_REPLY);
    }
}
