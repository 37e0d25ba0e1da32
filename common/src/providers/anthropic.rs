use rig::completion::Prompt;
use rig::providers::anthropic;
use tracing::debug;

use crate::error::AgentError;

// Anthropic Models
pub const CLAUDE_3_HAIKU: &str = "claude-3-haiku-20240307";

/// Thin wrapper over rig's Anthropic provider for single-shot prompts.
#[derive(Clone)]
pub struct Client {
    inner: anthropic::Client,
}

impl Client {
    pub fn new(api_key: &str) -> Self {
        Self {
            inner: anthropic::ClientBuilder::new(api_key).build(),
        }
    }

    /// Sends one user message and returns the model's text reply.
    pub async fn complete(&self, model: &str, prompt: &str, max_tokens: u64) -> Result<String, AgentError> {
        debug!(model, max_tokens, prompt_chars = prompt.len(), "Claude completion request");

        let agent = self.inner
            .agent(model)
            .max_tokens(max_tokens)
            .build();

        agent.prompt(prompt)
            .await
            .map_err(|e| AgentError::AIError(e.to_string()))
    }
}
