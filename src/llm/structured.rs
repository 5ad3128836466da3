//! Structured output and retry budget for model calls
//!
//! Structured steps (plan schema, topic list, section writing) ask the model for
//! a JSON object matching a schema derived with `schemars`. The reply is parsed
//! with `serde_json`; transport and parse failures are retried with exponential
//! backoff up to the client's `max_retries`, after which the step fails with
//! [`AppError::Synthesis`].

use crate::llm::client::LLMClient;
use crate::types::{AppError, Result};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;

const RETRY_BASE_DELAY: Duration = Duration::from_millis(200);
const RETRY_MAX_DELAY: Duration = Duration::from_secs(5);

/// System prompt suffix describing the JSON shape the model must return
pub fn schema_instructions<T: JsonSchema>() -> String {
    let schema = schemars::schema_for!(T);
    let schema = serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string());
    format!(
        "Respond with a single JSON object that validates against this JSON Schema. \
         Do not add any text before or after the JSON.\n\n{}",
        schema
    )
}

/// Locate the JSON object inside a model reply.
///
/// Handles bare JSON, fenced code blocks and leading/trailing prose.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a model reply into `T`
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> std::result::Result<T, String> {
    let json = extract_json(text).ok_or_else(|| "reply contains no JSON object".to_string())?;
    serde_json::from_str(json).map_err(|e| format!("reply does not match schema: {}", e))
}

fn backoff(attempt: u32) -> Duration {
    RETRY_BASE_DELAY
        .saturating_mul(2u32.saturating_pow(attempt))
        .min(RETRY_MAX_DELAY)
}

/// Run `call` until it succeeds or `max_retries` extra attempts are used up.
///
/// The last error is returned as a synthesis failure for `step`.
pub async fn with_retries<T, F, Fut>(step: &str, max_retries: u32, mut call: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, String>>,
{
    let mut attempt = 0;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(message) if attempt < max_retries => {
                tracing::warn!(
                    step,
                    attempt = attempt + 1,
                    max_retries,
                    error = %message,
                    "Model call failed, retrying"
                );
                tokio::time::sleep(backoff(attempt)).await;
                attempt += 1;
            }
            Err(message) => return Err(AppError::synthesis(step, message)),
        }
    }
}

/// Free-text generation with the client's retry budget
pub async fn generate_text(
    llm: &dyn LLMClient,
    step: &str,
    system: &str,
    prompt: &str,
) -> Result<String> {
    with_retries(step, llm.params().max_retries, || async move {
        let text = llm
            .generate_with_system(system, prompt)
            .await
            .map_err(|e| e.to_string())?;
        if text.trim().is_empty() {
            return Err("model returned an empty reply".to_string());
        }
        Ok(text)
    })
    .await
}

/// Structured generation: schema in the system prompt, JSON reply parsed into `T`
pub async fn generate_structured<T>(
    llm: &dyn LLMClient,
    step: &str,
    system: &str,
    prompt: &str,
) -> Result<T>
where
    T: DeserializeOwned + JsonSchema,
{
    let system = format!("{}\n\n{}", system, schema_instructions::<T>());
    let system = system.as_str();
    with_retries(step, llm.params().max_retries, || async move {
        let reply = llm
            .generate_with_system(system, prompt)
            .await
            .map_err(|e| e.to_string())?;
        parse_structured::<T>(&reply)
    })
    .await
}
