//! Message enhancer: appends one witty, mood-boosting line via Claude.
//!
//! The contract is best-effort on purpose: whatever goes wrong with the
//! completion call (network, auth, quota, empty reply), the caller still gets
//! usable text back. Enhancement failure must never fail the relay.

use crate::llm::CompletionBackend;
use std::sync::Arc;

/// Fallback suffix used when the completion backend fails.
pub const FALLBACK_LINE: &str = "😊 Stay awesome!";

/// Adds a witty line to messages using a completion backend.
#[derive(Clone)]
pub struct Enhancer {
    backend: Arc<dyn CompletionBackend>,
    model: String,
    max_tokens: u32,
}

impl Enhancer {
    pub fn new(backend: Arc<dyn CompletionBackend>, model: String, max_tokens: u32) -> Self {
        Self {
            backend,
            model,
            max_tokens,
        }
    }

    /// Enhance a message: original text plus one short appended remark.
    /// Always returns text — on any backend error the fixed fallback line is
    /// appended instead and the error is only logged.
    pub async fn enhance(&self, original_message: &str) -> String {
        let prompt = build_prompt(original_message);
        match self
            .backend
            .complete(&self.model, self.max_tokens, &prompt)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                log::warn!("enhancer: claude call failed, using fallback: {}", e);
                fallback(original_message)
            }
        }
    }
}

/// Deterministic substitute output: original message plus the fixed line.
pub fn fallback(original_message: &str) -> String {
    format!("{}\n\n{}", original_message, FALLBACK_LINE)
}

fn build_prompt(original_message: &str) -> String {
    format!(
        r#"You are a friendly assistant that adds witty, uplifting lines to messages.

Original message: "{}"

Your task:
1. Keep the original message intact
2. Add ONE short, witty line at the end that will make the recipient smile
3. Make it relevant to the message context
4. Keep it tasteful and friendly

Format your response as:
[Original message]

😊 [Your witty addition]"#,
        original_message
    )
}
