pub mod openai;

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::cli::Args;
use crate::errors::ChatError;
use crate::models::chat::ChatMessage;
use self::openai::OpenAiChatClient;

/// Token accounting as the provider reports it.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// What a completion call yields: the reply text, the model the provider
/// actually used, and token usage when reported.
#[derive(Debug, Clone)]
pub struct Completion {
    pub reply: String,
    pub model: String,
    pub usage: Option<TokenUsage>,
}

/// Seam for the hosted completion API. Fakes implement this in tests so the
/// coordinator can be exercised without network access.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
    ) -> Result<Completion, ChatError>;
}

pub fn new_provider(args: &Args) -> Result<Arc<dyn CompletionProvider>, ChatError> {
    let client = OpenAiChatClient::new(args.chat_api_key.clone(), args.chat_base_url.clone())?;
    Ok(Arc::new(client))
}
