use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use ideascope_config::LlmConfig;

/// Placed in the report when no generator is configured.
pub const DISABLED_INSIGHT: &str = "[Gemini disabled] Only summary is available.";

const DISABLED_MESSAGE: &str =
    "[Gemini disabled] Set GEMINI_API_KEY in your environment to enable predictions.";

/// An optional text-completion capability.
///
/// Implementations never fail: a disabled generator answers with a
/// `[... disabled]` message and call-time errors come back as
/// `[... error]` text.
#[async_trait]
pub trait InsightGenerator: Send + Sync {
    fn enabled(&self) -> bool;
    async fn generate(&self, prompt: &str) -> String;
}

/// The analyst prompt sent alongside a summary.
pub fn insight_prompt(summary: &str) -> String {
    format!(
        "You are an expert analyst. Based on the following summary, give:\n\
         1) Three short trend predictions\n\
         2) Three actionable insights\n\n\
         Summary:\n{summary}"
    )
}

/// Gemini `generateContent` client.  Enabled only when the config carries
/// an API key.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let api_key = config
            .has_credentials()
            .then(|| config.api_key.trim().to_string());

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    async fn generate_content(&self, api_key: &str, prompt: &str) -> Result<String> {
        let payload = json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ]
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;
        if !status.is_success() {
            anyhow::bail!("{status}: {}", error_message(&raw));
        }

        let body: serde_json::Value = serde_json::from_str(&raw)?;
        extract_candidate_text(&body)
            .ok_or_else(|| anyhow::anyhow!("response contained no candidate text"))
    }
}

#[async_trait]
impl InsightGenerator for GeminiClient {
    fn enabled(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, prompt: &str) -> String {
        let Some(api_key) = self.api_key.as_deref() else {
            return DISABLED_MESSAGE.to_string();
        };

        debug!(model = %self.model, prompt_chars = prompt.len(), "requesting insights");
        match self.generate_content(api_key, prompt).await {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "insight generation failed");
                format!("[Gemini error] {err}")
            }
        }
    }
}

/// `error.message` from a JSON error body, or the trimmed raw body when it
/// is not JSON (proxies answer with HTML).
fn error_message(raw: &str) -> String {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|body| {
            body.get("error")
                .and_then(|error| error.get("message"))
                .and_then(|message| message.as_str())
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| raw.trim().to_string())
}

/// Concatenate the text parts of the first candidate.
fn extract_candidate_text(body: &serde_json::Value) -> Option<String> {
    let parts = body
        .get("candidates")
        .and_then(|candidates| candidates.get(0))
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(|parts| parts.as_array())?;

    let text = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect::<Vec<_>>()
        .join("");

    if text.trim().is_empty() { None } else { Some(text) }
}

// ── Tests ────────────────────────────────────────────────────────────────────
